use std::sync::Arc;

use serde::Serialize;

use crate::attack::{Record, RecordKind, RelationshipIndex};
use crate::error::{InvalidRoot, TreeResult};
use crate::util::{Folded, fold_case};

pub const ROOT_IDENTITY: &str = "root";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Root,
    Tactic,
    Technique,
    SubTechnique,
}

impl NodeKind {
    /// Techniques and sub-techniques start collapsed; the root and tactics
    /// start expanded.
    pub fn expanded_by_default(self) -> bool {
        match self {
            Self::Root | Self::Tactic => true,
            Self::Technique | Self::SubTechnique => false,
        }
    }

    pub fn matches_code(self) -> bool {
        matches!(self, Self::Technique | Self::SubTechnique)
    }
}

/// One placement of a record in the tree. The same record may be placed
/// under several parents; each placement is a distinct node with its own
/// identity.
#[derive(Clone, Debug)]
pub struct TreeNode {
    identity: String,
    kind: NodeKind,
    record: Arc<Record>,
    children: Vec<TreeNode>,
    depth: usize,
    label: String,
    folded_label: Folded,
}

impl TreeNode {
    fn new(identity: String, kind: NodeKind, record: Arc<Record>, depth: usize) -> Self {
        let label = record.display_label();
        let folded_label = fold_case(&label);
        Self {
            identity,
            kind,
            record,
            children: Vec::new(),
            depth,
            label,
            folded_label,
        }
    }

    fn child(&self, kind: NodeKind, record: &Arc<Record>) -> Self {
        Self::new(
            format!("{}/{}", self.identity, record.id),
            kind,
            Arc::clone(record),
            self.depth + 1,
        )
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn record(&self) -> &Arc<Record> {
        &self.record
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn folded_label(&self) -> &Folded {
        &self.folded_label
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    pub fn identities(&self) -> Vec<String> {
        self.iter().map(|node| node.identity.clone()).collect()
    }

    pub fn find(&self, identity: &str) -> Option<&TreeNode> {
        if self.identity == identity {
            return Some(self);
        }
        // Identities are path-shaped, so only a prefix-matching child can hold it.
        let rest = identity.strip_prefix(self.identity.as_str())?;
        if !rest.starts_with('/') {
            return None;
        }
        self.children
            .iter()
            .find_map(|child| child.find(identity))
    }

    /// Identities from the root down to `identity`, inclusive.
    pub fn path_to(&self, identity: &str) -> Option<Vec<String>> {
        if self.identity == identity {
            return Some(vec![self.identity.clone()]);
        }
        for child in &self.children {
            if let Some(mut path) = child.path_to(identity) {
                path.insert(0, self.identity.clone());
                return Some(path);
            }
        }
        None
    }
}

pub struct PreOrder<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Builds the full tree rooted at `root`: tactics in declared order, their
/// techniques, then each technique's sub-techniques.
pub fn build(index: &RelationshipIndex, root: &Arc<Record>) -> TreeResult<TreeNode> {
    if root.kind != RecordKind::Matrix {
        return Err(InvalidRoot::WrongKind {
            id: root.id.clone(),
            kind: root.kind,
        }
        .into());
    }

    let mut tree = TreeNode::new(ROOT_IDENTITY.to_string(), NodeKind::Root, Arc::clone(root), 0);

    for tactic in index.tactics_for_matrix(root) {
        let mut tactic_node = tree.child(NodeKind::Tactic, &tactic);

        if let Some(short_name) = &tactic.short_name {
            for technique in index.techniques_for_tactic(short_name) {
                let mut technique_node = tactic_node.child(NodeKind::Technique, technique);
                for sub in index.sub_techniques_of(&technique.id) {
                    let sub_node = technique_node.child(NodeKind::SubTechnique, &sub);
                    technique_node.children.push(sub_node);
                }
                tactic_node.children.push(technique_node);
            }
        }

        tree.children.push(tactic_node);
    }

    tracing::debug!(
        root = %root.id,
        tactics = tree.children.len(),
        nodes = tree.node_count(),
        "built tree"
    );
    Ok(tree)
}

pub fn build_from_index(index: &RelationshipIndex) -> TreeResult<TreeNode> {
    let matrix = index.matrix()?;
    build(index, matrix)
}
