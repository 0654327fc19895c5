//! Split finding and gain computation.
//!
//! For each node, the best split is found by:
//! 1. Scanning every feature's histogram left to right, accumulating the
//!    left-side sums bin by bin
//! 2. Trying the node's missing samples on both sides of every boundary
//! 3. Keeping the candidate with maximum gain (see [`GainParams::compute_gain`])
//!
//! The search returns `None` when no boundary satisfies the per-child
//! constraints. A returned split may still have non-positive gain; the grower
//! decides whether it is worth applying.

mod find;
mod gain;

pub use find::{GreedySplitFinder, SplitFinder};
pub use gain::GainParams;

use crate::training::gbdt::histograms::GradientSums;

/// Best split found for a node.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitInfo {
    /// Feature index to split on.
    pub feature: usize,
    /// Regular bins `<= bin` go left.
    pub bin: u8,
    /// Direction of samples in the missing bin.
    pub missing_go_to_left: bool,
    /// Gain from this split.
    pub gain: f64,
    /// Statistics of the left child, missing samples included if they go left.
    pub left: GradientSums,
    /// Statistics of the right child, missing samples included if they go right.
    pub right: GradientSums,
}

impl SplitInfo {
    /// Whether a sample with bin `bin` on the split feature goes left.
    #[inline]
    pub fn goes_left(&self, bin: u8, missing_bin: u8) -> bool {
        if bin == missing_bin {
            self.missing_go_to_left
        } else {
            bin <= self.bin
        }
    }
}
