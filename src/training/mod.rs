//! Training infrastructure for gradient boosting.
//!
//! The boosting loop lives with the caller; this module grows one regression
//! tree per call from binned features and per-sample gradients:
//!
//! - [`GrowerParams`]: Growth constraints and regularization
//! - [`TreeGrower`]: Leaf-wise tree grower
//! - [`GainParams`]: Split gain and leaf value formulas
//!
//! See [`gbdt`] for histograms, split finding and row partitioning.

pub mod gbdt;

pub use gbdt::{
    GainParams, GradientSums, GrowerParams, GrowthState, GrowthStats, NodeId, SplitInfo, TreeGrower,
    TreeNode,
};
