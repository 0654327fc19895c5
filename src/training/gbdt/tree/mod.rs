//! Training-time tree structures.
//!
//! - [`TreeNode`]: A node of the tree being grown
//! - [`NodeId`]: Type alias for tree node indices

pub mod node;

pub use node::{NodeId, TreeNode};
