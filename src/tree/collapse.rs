use std::collections::HashMap;

use super::build::TreeNode;

/// Expanded/collapsed flag per node identity. Entries are created on first
/// observation with the kind's default and survive tree rebuilds as long as
/// identities stay stable.
#[derive(Clone, Debug, Default)]
pub struct CollapseStateStore {
    expanded: HashMap<String, bool>,
}

impl CollapseStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, root: &TreeNode) {
        for node in root.iter() {
            if !self.expanded.contains_key(node.identity()) {
                self.expanded.insert(
                    node.identity().to_string(),
                    node.kind().expanded_by_default(),
                );
            }
        }
    }

    pub fn is_expanded(&self, node: &TreeNode) -> bool {
        self.expanded
            .get(node.identity())
            .copied()
            .unwrap_or_else(|| node.kind().expanded_by_default())
    }

    pub fn state_of(&self, identity: &str) -> Option<bool> {
        self.expanded.get(identity).copied()
    }

    /// Flips a single node. Unknown identities are ignored.
    pub fn toggle(&mut self, identity: &str) -> bool {
        match self.expanded.get_mut(identity) {
            Some(expanded) => {
                *expanded = !*expanded;
                true
            }
            None => false,
        }
    }

    /// Sets the node and all of its descendants in the current `tree`.
    /// Returns false when `identity` is not in the tree.
    pub fn set_recursive(&mut self, tree: &TreeNode, identity: &str, expanded: bool) -> bool {
        let Some(node) = tree.find(identity) else {
            return false;
        };
        for descendant in node.iter() {
            self.expanded
                .insert(descendant.identity().to_string(), expanded);
        }
        true
    }

    pub fn reset(&mut self) {
        self.expanded.clear();
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}
