//! Trees whose nodes keep their children in sorted order.
//!
//! [`SortedTree`] stores nodes in a generational arena. Each node sorts its
//! children with its own [`ChildOrdering`]; children whose sort key changes
//! out-of-band are moved back into place when a [`TreeEvent`] is dispatched.

pub mod arena;
pub mod cli;
pub mod config;
pub mod errors;
pub mod event;
pub mod exitcode;
pub mod ordering;
pub mod outline;
pub mod tree_traits;
pub mod util;

pub use arena::{NodeId, SortedTree, TreeNode};
pub use errors::{TreeError, TreeResult};
pub use event::{TreeEvent, TreePath};
pub use ordering::ChildOrdering;
