//! Collapsible ATT&CK matrix tree: builds a rooted tree from flat records,
//! lays it out as a tidy tree and diffs successive layouts by node identity.

pub mod attack;
pub mod error;
pub mod layout;
pub mod reconcile;
pub mod session;
pub mod tree;
mod util;

pub use error::{DanglingReference, InvalidRoot, ReferenceKind, TreeError, TreeResult};
pub use layout::{Extent, Layout, LayoutEngine, LayoutOptions, LayoutPoint, Point};
pub use reconcile::{Diff, ExitTransition, Transition, diff};
pub use session::{DataState, Frame, TreeSession};
