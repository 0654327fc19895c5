//! Histogram building and operations.
//!
//! The main entry point is [`build_histograms_ordered`], which reads gradients
//! that were pre-gathered into partition order ("ordered gradients"). Bin
//! lookups still go through the row index, but gradient reads become
//! sequential.
//!
//! # Numeric Precision
//!
//! Bins accumulate in `f64` even though gradients arrive as `f32`. Gains are
//! differences of large sums, and the subtraction trick (sibling = parent -
//! child) makes those differences common.

use rayon::prelude::*;

use crate::data::binned::FeatureView;

use super::{FeatureMeta, GradientSums, HistogramBin};

/// Hessian input for histogram building.
#[derive(Clone, Copy, Debug)]
pub enum Hessians<'a> {
    /// Every sample shares this hessian. Bins get `count * value` after the
    /// gradient pass instead of a per-sample accumulation.
    Constant(f32),
    /// Per-sample hessians, gathered in the same order as the gradients.
    Ordered(&'a [f32]),
}

// =============================================================================
// Parallel Strategy
// =============================================================================

/// Parallelization strategy for histogram building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ParallelStrategy {
    /// Sequential processing (no parallelism).
    #[default]
    Sequential,
    /// Parallelize over features (each thread handles different features).
    FeatureParallel,
}

impl ParallelStrategy {
    /// Select a strategy from the node size and feature count.
    ///
    /// Small nodes stay sequential; thread dispatch costs more than the scan.
    pub fn auto_select(n_rows: usize, n_features: usize, n_threads: usize) -> Self {
        const MIN_ROWS_PARALLEL: usize = 1024;
        const MIN_FEATURES_PARALLEL: usize = 2;

        if n_rows < MIN_ROWS_PARALLEL || n_threads <= 1 || n_features < MIN_FEATURES_PARALLEL {
            Self::Sequential
        } else {
            Self::FeatureParallel
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

/// Build histograms for all features of one node.
///
/// # Arguments
///
/// * `histogram` - Zeroed node histogram, laid out by `feature_metas`
/// * `feature_metas` - Feature offset/size metadata
/// * `bin_views` - One view per feature into the binned matrix
/// * `indices` - Row indices of the node (used for bin lookup only)
/// * `ordered_grad` - Gradients gathered in `indices` order
/// * `hessians` - Constant hessian, or hessians gathered in `indices` order
pub fn build_histograms_ordered(
    histogram: &mut [HistogramBin],
    feature_metas: &[FeatureMeta],
    bin_views: &[FeatureView<'_>],
    indices: &[u32],
    ordered_grad: &[f32],
    hessians: Hessians<'_>,
) {
    debug_assert_eq!(ordered_grad.len(), indices.len());
    debug_assert_eq!(feature_metas.len(), bin_views.len());
    if let Hessians::Ordered(hess) = hessians {
        debug_assert_eq!(hess.len(), indices.len());
    }

    let strategy = ParallelStrategy::auto_select(
        indices.len(),
        feature_metas.len(),
        rayon::current_num_threads(),
    );

    match strategy {
        ParallelStrategy::Sequential => {
            for (meta, view) in feature_metas.iter().zip(bin_views) {
                let hist_slice = &mut histogram[meta.offset..meta.offset + meta.n_bins];
                build_feature_ordered(hist_slice, view, indices, ordered_grad, hessians);
            }
        }
        ParallelStrategy::FeatureParallel => {
            // Features own disjoint, consecutive regions of the histogram.
            let mut slices = Vec::with_capacity(feature_metas.len());
            let mut rest = histogram;
            for meta in feature_metas {
                let (head, tail) = rest.split_at_mut(meta.n_bins);
                slices.push(head);
                rest = tail;
            }
            slices
                .into_par_iter()
                .zip(bin_views.par_iter())
                .for_each(|(hist_slice, view)| {
                    build_feature_ordered(hist_slice, view, indices, ordered_grad, hessians);
                });
        }
    }
}

// =============================================================================
// Single-Feature Building
// =============================================================================

/// Build the histogram of a single feature.
///
/// Any bin at or beyond the feature's missing slot (the last one) lands in
/// the missing slot.
#[inline]
fn build_feature_ordered(
    histogram: &mut [HistogramBin],
    view: &FeatureView<'_>,
    indices: &[u32],
    ordered_grad: &[f32],
    hessians: Hessians<'_>,
) {
    match view.as_contiguous() {
        Some(bins) => accumulate(histogram, |row| bins[row], indices, ordered_grad, hessians),
        None => accumulate(histogram, |row| view.bin(row), indices, ordered_grad, hessians),
    }
}

#[inline(always)]
fn accumulate(
    histogram: &mut [HistogramBin],
    bin_of: impl Fn(usize) -> u8,
    indices: &[u32],
    ordered_grad: &[f32],
    hessians: Hessians<'_>,
) {
    let missing_slot = histogram.len() - 1;
    match hessians {
        Hessians::Ordered(ordered_hess) => {
            for ((&row, &grad), &hess) in indices.iter().zip(ordered_grad).zip(ordered_hess) {
                let slot = (bin_of(row as usize) as usize).min(missing_slot);
                let bin = &mut histogram[slot];
                bin.count += 1;
                bin.sum_gradients += grad as f64;
                bin.sum_hessians += hess as f64;
            }
        }
        Hessians::Constant(hess) => {
            for (&row, &grad) in indices.iter().zip(ordered_grad) {
                let slot = (bin_of(row as usize) as usize).min(missing_slot);
                let bin = &mut histogram[slot];
                bin.count += 1;
                bin.sum_gradients += grad as f64;
            }
            let hess = hess as f64;
            for bin in histogram.iter_mut() {
                bin.sum_hessians = bin.count as f64 * hess;
            }
        }
    }
}

// =============================================================================
// Histogram Operations
// =============================================================================

/// Check if sorted indices represent a contiguous range `[first, first + n)`.
///
/// Node indices are always ascending (partitioning is stable), so comparing
/// the endpoints is enough. The grower reads gradients straight from the input slice in that case
/// instead of gathering them.
#[inline]
pub fn is_contiguous_range(indices: &[u32]) -> bool {
    match (indices.first(), indices.last()) {
        (Some(&first), Some(&last)) => {
            last >= first && (last - first) as usize == indices.len() - 1
        }
        _ => true,
    }
}

/// Subtract histograms: dst -= src
///
/// Used for the subtraction trick: sibling = parent - child
#[inline]
pub fn subtract_histogram(dst: &mut [HistogramBin], src: &[HistogramBin]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d -= *s;
    }
}

/// Sum all bins in a histogram.
#[cfg(test)]
pub(crate) fn sum_histogram(histogram: &[HistogramBin]) -> GradientSums {
    histogram
        .iter()
        .fold(GradientSums::default(), |acc, &bin| acc + bin)
}

// =============================================================================
// Tests
// =============================================================================
