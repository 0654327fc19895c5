//! Histogram data structures for gradient boosting tree training.
//!
//! A node histogram stores, for every feature, one [`HistogramBin`] per
//! regular bin plus a trailing slot for missing values. Features are laid out
//! back to back in a single buffer described by [`HistogramLayout`].
//!
//! # Module Organization
//!
//! - [`ops`] - Histogram building and operations
//! - [`pool`] - Bounded cache of pending node histograms
//!
//! Only the smaller child of each split is built from rows. The larger child
//! is `parent - smaller` (the subtraction trick), which keeps histogram work
//! proportional to the smaller side of every split.

pub mod ops;
pub mod pool;

use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::data::binned::{BinLayout, FeatureView};

pub use ops::{
    Hessians, ParallelStrategy, build_histograms_ordered, is_contiguous_range, subtract_histogram,
};
pub use pool::{HistogramPool, PoolMetrics};

/// Gradient statistics of a set of samples.
///
/// Used both as a histogram bin and as the accumulated sums of a tree node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GradientSums {
    /// Sum of gradients.
    pub sum_gradients: f64,
    /// Sum of hessians.
    pub sum_hessians: f64,
    /// Number of samples.
    pub count: u32,
}

/// A histogram bin: gradient statistics of the samples falling into one bin.
pub type HistogramBin = GradientSums;

impl Add for GradientSums {
    type Output = Self;

    #[inline]
    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for GradientSums {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.sum_gradients += rhs.sum_gradients;
        self.sum_hessians += rhs.sum_hessians;
        self.count += rhs.count;
    }
}

impl Sub for GradientSums {
    type Output = Self;

    #[inline]
    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl SubAssign for GradientSums {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.sum_gradients -= rhs.sum_gradients;
        self.sum_hessians -= rhs.sum_hessians;
        self.count -= rhs.count;
    }
}

/// Location of one feature inside a node histogram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureMeta {
    /// Offset of the feature's first bin.
    pub offset: usize,
    /// Number of slots, including the trailing missing slot.
    pub n_bins: usize,
}

impl FeatureMeta {
    /// Number of regular bins.
    #[inline]
    pub fn n_bins_non_missing(&self) -> usize {
        self.n_bins - 1
    }
}

/// Histogram layout shared by every node of a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistogramLayout {
    features: Box<[FeatureMeta]>,
    total_bins: usize,
}

impl HistogramLayout {
    /// One slot per regular bin plus a missing slot, for every feature.
    pub fn new(bin_layout: &BinLayout) -> Self {
        let mut offset = 0;
        let features: Box<[FeatureMeta]> = bin_layout
            .n_bins_non_missing_all()
            .iter()
            .map(|&n| {
                let meta = FeatureMeta {
                    offset,
                    n_bins: n + 1,
                };
                offset += n + 1;
                meta
            })
            .collect();
        Self {
            features,
            total_bins: offset,
        }
    }

    /// Per-feature metadata.
    #[inline]
    pub fn features(&self) -> &[FeatureMeta] {
        &self.features
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Total number of slots across features.
    #[inline]
    pub fn total_bins(&self) -> usize {
        self.total_bins
    }
}

/// Gradient histogram of one node, for all features.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeHistogram {
    bins: Box<[HistogramBin]>,
}

impl NodeHistogram {
    /// Empty histogram.
    pub fn zeros(layout: &HistogramLayout) -> Self {
        Self {
            bins: vec![HistogramBin::default(); layout.total_bins()].into_boxed_slice(),
        }
    }

    /// Build from the rows of a node. See [`build_histograms_ordered`].
    pub fn build(
        layout: &HistogramLayout,
        bin_views: &[FeatureView<'_>],
        indices: &[u32],
        ordered_grad: &[f32],
        hessians: Hessians<'_>,
    ) -> Self {
        let mut histogram = Self::zeros(layout);
        build_histograms_ordered(
            &mut histogram.bins,
            layout.features(),
            bin_views,
            indices,
            ordered_grad,
            hessians,
        );
        histogram
    }

    /// Bins of one feature; the last slot holds missing values.
    #[inline]
    pub fn feature(&self, meta: &FeatureMeta) -> &[HistogramBin] {
        &self.bins[meta.offset..meta.offset + meta.n_bins]
    }

    /// All bins.
    #[inline]
    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    /// In-place `self -= other`, turning a parent histogram into the sibling
    /// of `other`.
    pub fn subtract(&mut self, other: &NodeHistogram) {
        subtract_histogram(&mut self.bins, &other.bins);
    }
}
