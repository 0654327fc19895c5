//! Bin layout metadata and per-feature access into a binned matrix.

use std::borrow::Cow;

use ndarray::{ArrayView2, Axis};

use crate::error::{Error, Result};

/// Per-feature bin counts plus the reserved missing-value bin index.
///
/// This is everything the grower needs to know about how a matrix was binned:
/// feature `f` uses bins `0..n_bins_non_missing[f]`, and any sample whose value
/// was missing carries `missing_bin` instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinLayout {
    n_bins_non_missing: Box<[usize]>,
    missing_bin: u8,
}

impl BinLayout {
    /// Create a layout from explicit bin counts.
    ///
    /// Every feature must have at least one non-missing bin, and the missing
    /// bin index must not collide with a regular bin.
    pub fn new(n_bins_non_missing: Vec<usize>, missing_bin: u8) -> Result<Self> {
        if n_bins_non_missing.is_empty() {
            return Err(Error::EmptyInput {
                n_samples: 0,
                n_features: 0,
            });
        }
        for (feature, &n_bins) in n_bins_non_missing.iter().enumerate() {
            if n_bins == 0 || n_bins > missing_bin as usize {
                return Err(Error::BinOutOfRange {
                    row: 0,
                    feature,
                    bin: missing_bin,
                    n_bins,
                    missing_bin,
                });
            }
        }
        Ok(Self {
            n_bins_non_missing: n_bins_non_missing.into_boxed_slice(),
            missing_bin,
        })
    }

    /// Layout from counts already known to be consistent.
    pub(crate) fn from_parts(n_bins_non_missing: Vec<usize>, missing_bin: u8) -> Self {
        debug_assert!(
            n_bins_non_missing
                .iter()
                .all(|&n| n >= 1 && n <= missing_bin as usize)
        );
        Self {
            n_bins_non_missing: n_bins_non_missing.into_boxed_slice(),
            missing_bin,
        }
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_bins_non_missing.len()
    }

    /// Number of regular (non-missing) bins of a feature.
    #[inline]
    pub fn n_bins_non_missing(&self, feature: usize) -> usize {
        self.n_bins_non_missing[feature]
    }

    /// Regular bin counts for all features.
    #[inline]
    pub fn n_bins_non_missing_all(&self) -> &[usize] {
        &self.n_bins_non_missing
    }

    /// Bin index reserved for missing values.
    #[inline]
    pub fn missing_bin(&self) -> u8 {
        self.missing_bin
    }

    /// Check that every entry of `binned` is a declared bin for its feature.
    pub fn validate(&self, binned: &ArrayView2<'_, u8>) -> Result<()> {
        if binned.ncols() != self.n_features() {
            return Err(Error::FeatureCountMismatch {
                expected: self.n_features(),
                found: binned.ncols(),
            });
        }
        for (feature, column) in binned.axis_iter(Axis(1)).enumerate() {
            let n_bins = self.n_bins_non_missing[feature];
            let bad = column
                .iter()
                .position(|&b| (b as usize) >= n_bins && b != self.missing_bin);
            if let Some(row) = bad {
                return Err(Error::BinOutOfRange {
                    row,
                    feature,
                    bin: column[row],
                    n_bins,
                    missing_bin: self.missing_bin,
                });
            }
        }
        Ok(())
    }
}

/// Strided view of one feature's bins.
///
/// Column-major matrices give `stride == 1`; row-major matrices give
/// `stride == n_features`, starting at the feature's offset.
#[derive(Clone, Copy, Debug)]
pub struct FeatureView<'a> {
    bins: &'a [u8],
    stride: usize,
}

impl<'a> FeatureView<'a> {
    /// View over contiguous or strided bins.
    #[inline]
    pub fn new(bins: &'a [u8], stride: usize) -> Self {
        debug_assert!(stride >= 1);
        Self { bins, stride }
    }

    /// Bin of a row.
    #[inline]
    pub fn bin(&self, row: usize) -> u8 {
        self.bins[row * self.stride]
    }

    /// Contiguous bins, when the view has unit stride.
    #[inline]
    pub fn as_contiguous(&self) -> Option<&'a [u8]> {
        (self.stride == 1).then_some(self.bins)
    }
}

/// Binned feature matrix in a layout the grower can slice per feature.
///
/// Row-major and column-major inputs are borrowed as-is. Any other layout
/// (sliced or transposed views with gaps) is copied into column-major order.
#[derive(Clone, Debug)]
pub struct BinnedMatrix<'a> {
    data: Cow<'a, [u8]>,
    n_samples: usize,
    n_features: usize,
    row_stride: usize,
    feature_stride: usize,
}

impl<'a> BinnedMatrix<'a> {
    /// Wrap a `(n_samples, n_features)` view.
    pub fn new(binned: ArrayView2<'a, u8>) -> Self {
        let (n_samples, n_features) = binned.dim();
        if let Some(data) = binned.to_slice() {
            return Self {
                data: Cow::Borrowed(data),
                n_samples,
                n_features,
                row_stride: n_features,
                feature_stride: 1,
            };
        }
        if let Some(data) = binned.reversed_axes().to_slice() {
            return Self {
                data: Cow::Borrowed(data),
                n_samples,
                n_features,
                row_stride: 1,
                feature_stride: n_samples,
            };
        }
        let data: Vec<u8> = binned.t().iter().copied().collect();
        Self {
            data: Cow::Owned(data),
            n_samples,
            n_features,
            row_stride: 1,
            feature_stride: n_samples,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Number of columns.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Whether the matrix was copied instead of borrowed.
    pub fn is_owned(&self) -> bool {
        matches!(self.data, Cow::Owned(_))
    }

    /// Bins of one feature.
    #[inline]
    pub fn feature(&self, feature: usize) -> FeatureView<'_> {
        let start = feature * self.feature_stride;
        FeatureView::new(self.data.get(start..).unwrap_or(&[]), self.row_stride)
    }

    /// Views of every feature, in feature order.
    pub fn feature_views(&self) -> Vec<FeatureView<'_>> {
        (0..self.n_features).map(|f| self.feature(f)).collect()
    }

    /// Bin at `(row, feature)`.
    #[inline]
    pub fn get(&self, row: usize, feature: usize) -> u8 {
        self.data[row * self.row_stride + feature * self.feature_stride]
    }
}
