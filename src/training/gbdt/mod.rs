//! Gradient Boosted Decision Tree (GBDT) training module.
//!
//! This module contains all components of single-tree growth:
//!
//! - [`expansion`] - Best-first growth queue
//! - [`grower`] - Main tree growing orchestration
//! - [`histograms`] - Histogram data structures for gradient accumulation
//! - [`params`] - Growth parameters
//! - [`partition`] - Row index partitioning for tree nodes
//! - [`split`] - Split types, gain computation, and finding algorithms
//! - [`tree`] - Nodes of the tree being grown

pub mod expansion;
pub mod grower;
pub mod histograms;
pub mod params;
pub mod partition;
pub mod split;
pub mod tree;

// Re-export main types
pub use expansion::{GrowthQueue, NodeCandidate};
pub use grower::{GrowthState, GrowthStats, TreeGrower};
pub use histograms::{
    FeatureMeta, GradientSums, HistogramBin, HistogramLayout, HistogramPool, NodeHistogram,
    ParallelStrategy as HistogramParallelStrategy, PoolMetrics,
};
pub use params::GrowerParams;
pub use partition::RowPartitioner;
pub use split::{GainParams, GreedySplitFinder, SplitFinder, SplitInfo};
pub use tree::{NodeId, TreeNode};
