use std::collections::BTreeMap;

use serde::Serialize;

use crate::attack::{Dataset, RelationshipIndex};
use crate::error::TreeResult;
use crate::layout::{Layout, LayoutEngine, LayoutOptions, LayoutPoint};
use crate::reconcile::{Diff, diff};
use crate::tree::{
    CollapseStateStore, ROOT_IDENTITY, SearchResult, Span, Suggestion, TreeNode, VisibleSet,
    apply, build_from_index, suggest,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Frame {
    pub visible: VisibleSet,
    pub layout: Layout,
    pub diff: Diff,
    pub highlights: BTreeMap<String, Vec<Span>>,
}

/// Owns one loaded dataset plus the interactive state layered over it. Each
/// mutating call recomputes the visible set and layout and diffs against the
/// previous layout.
pub struct TreeSession {
    index: RelationshipIndex,
    tree: TreeNode,
    collapse: CollapseStateStore,
    search: SearchResult,
    engine: LayoutEngine,
    visible: VisibleSet,
    layout: Layout,
}

impl TreeSession {
    pub fn new(dataset: Dataset, options: LayoutOptions) -> TreeResult<Self> {
        let (index, tree) = Self::build(dataset)?;
        let mut collapse = CollapseStateStore::new();
        collapse.observe(&tree);

        let search = apply(&tree, "");
        let engine = LayoutEngine::new(options);
        let visible = VisibleSet::compute(&tree, &collapse, Some(&search));
        let layout = engine.layout(&tree, &visible);

        tracing::info!(
            records = index.record_count(),
            edges = index.edge_count(),
            nodes = tree.node_count(),
            visible = visible.len(),
            "session ready"
        );

        Ok(Self {
            index,
            tree,
            collapse,
            search,
            engine,
            visible,
            layout,
        })
    }

    fn build(dataset: Dataset) -> TreeResult<(RelationshipIndex, TreeNode)> {
        let index = RelationshipIndex::build(dataset.records, dataset.edges)?;
        let tree = build_from_index(&index)?;
        Ok((index, tree))
    }

    pub fn index(&self) -> &RelationshipIndex {
        &self.index
    }

    pub fn tree(&self) -> &TreeNode {
        &self.tree
    }

    pub fn collapse_state(&self) -> &CollapseStateStore {
        &self.collapse
    }

    pub fn search(&self) -> &SearchResult {
        &self.search
    }

    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn snapshot(&self) -> Frame {
        let root = self.root_point();
        Frame {
            visible: self.visible.clone(),
            layout: self.layout.clone(),
            diff: diff(&self.layout, &self.layout, &root, None),
            highlights: self.search.highlights.clone(),
        }
    }

    pub fn toggle(&mut self, identity: &str) -> Frame {
        if !self.collapse.toggle(identity) {
            tracing::debug!(identity, "toggle ignored for unknown identity");
        }
        self.refresh(Some(identity))
    }

    pub fn set_recursive(&mut self, identity: &str, expanded: bool) -> Frame {
        self.collapse.set_recursive(&self.tree, identity, expanded);
        self.refresh(Some(identity))
    }

    pub fn expand_all(&mut self) -> Frame {
        self.set_recursive(ROOT_IDENTITY, true)
    }

    pub fn collapse_all(&mut self) -> Frame {
        self.set_recursive(ROOT_IDENTITY, false)
    }

    pub fn set_query(&mut self, query: &str) -> Frame {
        self.search = apply(&self.tree, query);
        self.refresh(None)
    }

    pub fn suggest(&self, query: &str, limit: usize) -> Vec<Suggestion> {
        suggest(&self.tree, query, limit)
    }

    /// Clears every collapse override back to the kind defaults.
    pub fn reset(&mut self) -> Frame {
        self.collapse.reset();
        self.collapse.observe(&self.tree);
        tracing::info!("collapse state reset");
        self.refresh(None)
    }

    /// Swaps in a new dataset, keeping collapse state and query for
    /// identities that survive. On failure the current state is untouched.
    pub fn reload(&mut self, dataset: Dataset) -> TreeResult<Frame> {
        let (index, tree) = Self::build(dataset)?;
        self.index = index;
        self.tree = tree;
        self.collapse.observe(&self.tree);
        let query = std::mem::take(&mut self.search.query);
        self.search = apply(&self.tree, &query);
        tracing::info!(nodes = self.tree.node_count(), "dataset reloaded");
        Ok(self.refresh(None))
    }

    fn root_point(&self) -> LayoutPoint {
        self.layout
            .get(self.tree.identity())
            .cloned()
            .unwrap_or_else(|| LayoutPoint {
                identity: self.tree.identity().to_string(),
                x: 0.0,
                y: 0.0,
            })
    }

    fn refresh(&mut self, trigger: Option<&str>) -> Frame {
        let previous_root = self.root_point();
        let visible = VisibleSet::compute(&self.tree, &self.collapse, Some(&self.search));
        let layout = self.engine.layout(&self.tree, &visible);
        let diff = diff(&self.layout, &layout, &previous_root, trigger);

        self.visible = visible;
        self.layout = layout;

        Frame {
            visible: self.visible.clone(),
            layout: self.layout.clone(),
            diff,
            highlights: self.search.highlights.clone(),
        }
    }
}

/// Load outcome as the caller sees it. Fatal build errors collapse into a
/// single unavailable state; no partial tree is exposed.
pub enum DataState {
    Ready(Box<TreeSession>),
    Unavailable(String),
}

impl DataState {
    pub fn load(dataset: Dataset, options: LayoutOptions) -> Self {
        match TreeSession::new(dataset, options) {
            Ok(session) => Self::Ready(Box::new(session)),
            Err(error) => {
                tracing::warn!(%error, "data unavailable");
                Self::Unavailable(error.to_string())
            }
        }
    }

    pub fn session(&self) -> Option<&TreeSession> {
        match self {
            Self::Ready(session) => Some(session.as_ref()),
            Self::Unavailable(_) => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut TreeSession> {
        match self {
            Self::Ready(session) => Some(session.as_mut()),
            Self::Unavailable(_) => None,
        }
    }
}
