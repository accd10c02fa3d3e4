use std::collections::HashSet;

use serde::Serialize;

use super::build::TreeNode;
use super::collapse::CollapseStateStore;
use super::search::SearchResult;

/// Identities eligible for rendering, in pre-order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VisibleSet {
    identities: Vec<String>,
    #[serde(skip)]
    members: HashSet<String>,
}

impl PartialEq for VisibleSet {
    fn eq(&self, other: &Self) -> bool {
        self.identities == other.identities
    }
}

impl Eq for VisibleSet {}

impl VisibleSet {
    /// Walks down from the root. Without an active search a node shows its
    /// children when expanded. With one, children on a match path are shown
    /// regardless of collapse state, and an expanded direct match also shows
    /// the rest of its children. An expanded node that is only an ancestor
    /// of a match shows its on-path children and nothing else.
    pub fn compute(
        root: &TreeNode,
        collapse: &CollapseStateStore,
        search: Option<&SearchResult>,
    ) -> Self {
        let search = search.filter(|search| search.is_active());
        let mut set = Self::default();
        set.collect(root, collapse, search);
        set
    }

    fn collect(
        &mut self,
        node: &TreeNode,
        collapse: &CollapseStateStore,
        search: Option<&SearchResult>,
    ) {
        self.identities.push(node.identity().to_string());
        self.members.insert(node.identity().to_string());

        let expanded = collapse.is_expanded(node);
        let show_all = match search {
            None => expanded,
            Some(search) => expanded && search.is_match(node.identity()),
        };

        for child in node.children() {
            let on_match_path = search.is_some_and(|search| search.contains(child.identity()));
            if show_all || on_match_path {
                self.collect(child, collapse, search);
            }
        }
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.members.contains(identity)
    }

    pub fn identities(&self) -> &[String] {
        &self.identities
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
