//! Quantile binning of raw feature columns.
//!
//! [`BinMapper::fit`] learns per-feature thresholds from a raw `f64` matrix;
//! [`BinMapper::transform`] maps any matrix with the same features to `u8`
//! bins. Missing values (`NaN`) go to a reserved bin shared by all features,
//! whose index equals the number of regular bins allowed per feature
//! (`max_bins`, or 255 when `max_bins` is 256).

use bon::Builder;
use ndarray::{Array2, ArrayView1, ArrayView2, ShapeBuilder, Zip};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use super::layout::BinLayout;
use super::quantile::find_thresholds;
use crate::error::{ConfigError, Error, Result};

/// Largest supported number of regular bins (one `u8` value stays reserved).
pub const MAX_BINS: usize = 255;

/// Largest accepted `max_bins`: the whole `u8` range, missing bin included.
const MAX_TOTAL_BINS: usize = MAX_BINS + 1;

// ============================================================================
// BinningParams
// ============================================================================

/// Parameters controlling how features are discretized.
///
/// ```
/// use histboost::data::BinningParams;
///
/// let params = BinningParams::builder().max_bins(64).seed(7).build().unwrap();
/// assert_eq!(params.max_bins, 64);
/// ```
#[derive(Clone, Debug, Builder)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
pub struct BinningParams {
    /// Maximum number of regular bins per feature, in `2..=256`. 256 spans
    /// the whole `u8` range, so one of its values is the missing bin and at
    /// most 255 bins stay regular. Default: 255.
    #[builder(default = MAX_BINS)]
    pub max_bins: usize,

    /// Number of samples used to estimate quantiles. Larger inputs are
    /// subsampled without replacement. Default: 200 000.
    #[builder(default = 200_000)]
    pub subsample: usize,

    /// Seed for the quantile subsample. Default: 0.
    #[builder(default = 0)]
    pub seed: u64,
}

impl<S: binning_params_builder::IsComplete> BinningParamsBuilder<S> {
    /// Build and validate the parameters.
    pub fn build(self) -> std::result::Result<BinningParams, ConfigError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl Default for BinningParams {
    fn default() -> Self {
        Self {
            max_bins: MAX_BINS,
            subsample: 200_000,
            seed: 0,
        }
    }
}

impl BinningParams {
    /// Check parameter ranges.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(2..=MAX_TOTAL_BINS).contains(&self.max_bins) {
            return Err(ConfigError::InvalidMaxBins(self.max_bins));
        }
        if self.subsample == 0 {
            return Err(ConfigError::InvalidSubsample(self.subsample));
        }
        Ok(())
    }

    /// Number of regular bins a feature may use.
    #[inline]
    pub fn max_regular_bins(&self) -> usize {
        self.max_bins.min(MAX_BINS)
    }

    /// Bin index reserved for missing values.
    #[inline]
    pub fn missing_bin(&self) -> u8 {
        self.max_regular_bins() as u8
    }
}

// ============================================================================
// FeatureBins
// ============================================================================

/// Learned binning for a single feature.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureBins {
    /// Sorted cut points between consecutive bins.
    thresholds: Box<[f64]>,
    /// Whether missing values were seen while fitting.
    has_missing: bool,
}

impl FeatureBins {
    /// Create from explicit thresholds (must be strictly increasing).
    pub fn new(thresholds: Vec<f64>, has_missing: bool) -> Self {
        debug_assert!(thresholds.windows(2).all(|w| w[0] < w[1]));
        Self {
            thresholds: thresholds.into_boxed_slice(),
            has_missing,
        }
    }

    /// Cut points between bins.
    #[inline]
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Whether the training column contained missing values.
    #[inline]
    pub fn has_missing(&self) -> bool {
        self.has_missing
    }

    /// Number of regular bins (thresholds + 1).
    #[inline]
    pub fn n_bins_non_missing(&self) -> usize {
        self.thresholds.len() + 1
    }

    /// Number of bins actually realized, counting the missing bin if used.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.n_bins_non_missing() + usize::from(self.has_missing)
    }

    /// Map a raw value to its bin: the count of thresholds strictly below it.
    #[inline]
    pub fn value_to_bin(&self, value: f64, missing_bin: u8) -> u8 {
        if value.is_nan() {
            return missing_bin;
        }
        self.thresholds.partition_point(|&t| t < value) as u8
    }

    fn bin_column(&self, values: ArrayView1<'_, f64>, out: ndarray::ArrayViewMut1<'_, u8>, missing_bin: u8) {
        Zip::from(out)
            .and(values)
            .for_each(|bin, &value| *bin = self.value_to_bin(value, missing_bin));
    }
}

impl AsRef<[f64]> for FeatureBins {
    fn as_ref(&self) -> &[f64] {
        &self.thresholds
    }
}

// ============================================================================
// BinMapper
// ============================================================================

/// Fitted per-feature binning for a raw feature matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct BinMapper {
    features: Box<[FeatureBins]>,
    max_bins: usize,
}

impl BinMapper {
    /// Learn bin thresholds for every column of `x`.
    ///
    /// Missing values are ignored when computing thresholds. Infinite values
    /// are rejected.
    #[tracing::instrument(
        name = "bin_mapper_fit",
        skip_all,
        fields(n_samples = x.nrows(), n_features = x.ncols(), max_bins = params.max_bins)
    )]
    pub fn fit(params: &BinningParams, x: ArrayView2<'_, f64>) -> Result<Self> {
        params.validate()?;
        check_input(&x)?;

        let n_samples = x.nrows();
        let rows: Option<Vec<usize>> = (n_samples > params.subsample).then(|| {
            let mut rng = StdRng::seed_from_u64(params.seed);
            let mut rows = rand::seq::index::sample(&mut rng, n_samples, params.subsample).into_vec();
            rows.sort_unstable();
            rows
        });
        if let Some(rows) = &rows {
            tracing::debug!(n_rows = rows.len(), "estimating quantiles on a subsample");
        }

        let max_bins = params.max_regular_bins();
        let features: Vec<FeatureBins> = (0..x.ncols())
            .into_par_iter()
            .map(|f| {
                let column = x.column(f);
                let has_missing = column.iter().any(|v| v.is_nan());
                let mut values: Vec<f64> = match &rows {
                    Some(rows) => rows.iter().map(|&r| column[r]).filter(|v| !v.is_nan()).collect(),
                    None => column.iter().copied().filter(|v| !v.is_nan()).collect(),
                };
                FeatureBins::new(find_thresholds(&mut values, max_bins), has_missing)
            })
            .collect();

        tracing::debug!(
            total_bins = features.iter().map(FeatureBins::n_bins).sum::<usize>(),
            "fitted bin thresholds"
        );

        Ok(Self {
            features: features.into_boxed_slice(),
            max_bins,
        })
    }

    /// Map every value of `x` to its bin.
    ///
    /// The result is column-major so each feature's bins are contiguous.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<u8>> {
        if x.ncols() != self.n_features() {
            return Err(Error::FeatureCountMismatch {
                expected: self.n_features(),
                found: x.ncols(),
            });
        }
        check_input(&x)?;

        let missing_bin = self.missing_bin();
        let mut binned = Array2::<u8>::zeros((x.nrows(), x.ncols()).f());
        Zip::from(binned.columns_mut())
            .and(x.columns())
            .and(ArrayView1::from(&self.features[..]))
            .par_for_each(|out, values, feature| feature.bin_column(values, out, missing_bin));
        Ok(binned)
    }

    /// Fit on `x` and return its binned form.
    pub fn fit_transform(params: &BinningParams, x: ArrayView2<'_, f64>) -> Result<(Self, Array2<u8>)> {
        let mapper = Self::fit(params, x)?;
        let binned = mapper.transform(x)?;
        Ok((mapper, binned))
    }

    /// Number of features seen during fit.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Maximum number of regular bins per feature.
    #[inline]
    pub fn max_bins(&self) -> usize {
        self.max_bins
    }

    /// Bin index reserved for missing values.
    #[inline]
    pub fn missing_bin(&self) -> u8 {
        self.max_bins as u8
    }

    /// Per-feature binning, usable as the threshold table for compiling a tree.
    #[inline]
    pub fn features(&self) -> &[FeatureBins] {
        &self.features
    }

    /// Thresholds of one feature.
    #[inline]
    pub fn bin_thresholds(&self, feature: usize) -> &[f64] {
        self.features[feature].thresholds()
    }

    /// Realized bin count per feature, including the missing bin when used.
    pub fn n_bins_per_feature(&self) -> Vec<usize> {
        self.features.iter().map(FeatureBins::n_bins).collect()
    }

    /// Layout describing the matrices produced by [`transform`](Self::transform).
    pub fn layout(&self) -> BinLayout {
        BinLayout::from_parts(
            self.features.iter().map(FeatureBins::n_bins_non_missing).collect(),
            self.missing_bin(),
        )
    }
}

/// Reject empty matrices and infinite values.
fn check_input(x: &ArrayView2<'_, f64>) -> Result<()> {
    let (n_samples, n_features) = x.dim();
    if n_samples == 0 || n_features == 0 {
        return Err(Error::EmptyInput { n_samples, n_features });
    }
    if let Some(((row, feature), &value)) = x.indexed_iter().find(|(_, v)| v.is_infinite()) {
        return Err(Error::NonFiniteValue { row, feature, value });
    }
    Ok(())
}
