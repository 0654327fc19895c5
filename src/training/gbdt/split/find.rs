//! Greedy split search over node histograms.

use rayon::prelude::*;

use super::{GainParams, SplitInfo};
use crate::training::gbdt::histograms::{GradientSums, HistogramBin, HistogramLayout, NodeHistogram};

// ============================================================================
// SplitFinder Trait
// ============================================================================

/// Strategy for finding the best split for a node.
pub trait SplitFinder: Send + Sync {
    /// Find the best split of a node given its histogram and total statistics.
    ///
    /// Returns `None` if no candidate satisfies the per-child constraints.
    fn find_best_split(
        &self,
        histogram: &NodeHistogram,
        layout: &HistogramLayout,
        node: &GradientSums,
        params: &GainParams,
    ) -> Option<SplitInfo>;
}

// ============================================================================
// GreedySplitFinder
// ============================================================================

/// Standard greedy split finder.
///
/// Enumerates all bin boundaries of all features and returns the boundary
/// with the highest gain. Ties keep the lower feature, then the lower bin,
/// then "missing goes left".
///
/// # Complexity
///
/// O(n_features × n_bins)
#[derive(Clone, Copy, Debug)]
pub struct GreedySplitFinder {
    /// Evaluate features on the rayon pool once a node has this many features.
    pub min_features_parallel: usize,
}

impl Default for GreedySplitFinder {
    fn default() -> Self {
        Self {
            min_features_parallel: 16,
        }
    }
}

impl GreedySplitFinder {
    /// Sequential search over all features.
    pub fn find_best_split_sequential(
        &self,
        histogram: &NodeHistogram,
        layout: &HistogramLayout,
        node: &GradientSums,
        params: &GainParams,
    ) -> Option<SplitInfo> {
        let parent_score = params.node_score(node.sum_gradients, node.sum_hessians);
        layout
            .features()
            .iter()
            .enumerate()
            .map(|(feature, meta)| {
                find_best_split_for_feature(feature, histogram.feature(meta), node, parent_score, params)
            })
            .fold(None, pick_better)
    }

    /// Search with features evaluated in parallel.
    ///
    /// Gives the same answer as the sequential search: the reduction compares
    /// feature indices on equal gains.
    pub fn find_best_split_parallel(
        &self,
        histogram: &NodeHistogram,
        layout: &HistogramLayout,
        node: &GradientSums,
        params: &GainParams,
    ) -> Option<SplitInfo> {
        let parent_score = params.node_score(node.sum_gradients, node.sum_hessians);
        layout
            .features()
            .par_iter()
            .enumerate()
            .map(|(feature, meta)| {
                find_best_split_for_feature(feature, histogram.feature(meta), node, parent_score, params)
            })
            .reduce(|| None, pick_better)
    }
}

impl SplitFinder for GreedySplitFinder {
    fn find_best_split(
        &self,
        histogram: &NodeHistogram,
        layout: &HistogramLayout,
        node: &GradientSums,
        params: &GainParams,
    ) -> Option<SplitInfo> {
        if layout.n_features() >= self.min_features_parallel {
            self.find_best_split_parallel(histogram, layout, node, params)
        } else {
            self.find_best_split_sequential(histogram, layout, node, params)
        }
    }
}

/// Keep the higher gain; equal gains keep the lower feature index.
fn pick_better(a: Option<SplitInfo>, b: Option<SplitInfo>) -> Option<SplitInfo> {
    match (a, b) {
        (Some(a), Some(b)) => {
            if b.gain > a.gain || (b.gain == a.gain && b.feature < a.feature) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (a, None) => a,
        (None, b) => b,
    }
}

/// Find the best split of one feature.
///
/// `bins` holds the regular bins followed by the missing slot. Boundaries
/// `0..n - 1` are tried with the missing samples on each side. The boundary
/// after the last regular bin only separates "present" from "missing", so it
/// is tried with missing samples going right. When the node holds no missing
/// samples, missing values follow the larger child.
fn find_best_split_for_feature(
    feature: usize,
    bins: &[HistogramBin],
    node: &GradientSums,
    parent_score: f64,
    params: &GainParams,
) -> Option<SplitInfo> {
    let n_bins_non_missing = bins.len() - 1;
    let missing = bins[n_bins_non_missing];
    let non_missing = *node - missing;

    let mut best: Option<SplitInfo> = None;
    let mut consider = |bin: usize, left: GradientSums, right: GradientSums, missing_go_to_left: bool| {
        if !params.is_valid_split(&left, &right) {
            return;
        }
        let gain = params.compute_gain(&left, &right, parent_score);
        if best.as_ref().is_none_or(|b| gain > b.gain) {
            best = Some(SplitInfo {
                feature,
                bin: bin as u8,
                missing_go_to_left,
                gain,
                left,
                right,
            });
        }
    };

    let mut left = GradientSums::default();
    for (bin, stats) in bins[..n_bins_non_missing].iter().enumerate() {
        left += *stats;
        let right = non_missing - left;
        let is_last = bin + 1 == n_bins_non_missing;

        if missing.count == 0 {
            if is_last {
                break;
            }
            consider(bin, left, right, left.count >= right.count);
        } else {
            if !is_last {
                consider(bin, left + missing, right, true);
            }
            consider(bin, left, right + missing, false);
        }
    }

    best
}

// ============================================================================
// Tests
// ============================================================================
