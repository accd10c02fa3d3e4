mod build;
mod collapse;
mod search;
mod visible;

pub use build::{NodeKind, PreOrder, ROOT_IDENTITY, TreeNode, build, build_from_index};
pub use collapse::CollapseStateStore;
pub use search::{SearchResult, Span, Suggestion, apply, suggest};
pub use visible::VisibleSet;
