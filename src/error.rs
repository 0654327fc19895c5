//! Error types shared by binning, tree growth and prediction.

/// Errors raised while validating a parameter group.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// `max_bins` must lie in `2..=256`: 256 is the full `u8` range, shared
    /// by 255 regular bins and the missing bin.
    #[error("max_bins must be in [2, 256], got {0}")]
    InvalidMaxBins(usize),
    /// The quantile subsample must keep at least one sample.
    #[error("subsample must be at least 1, got {0}")]
    InvalidSubsample(usize),
    /// A tree needs room for at least one split.
    #[error("max_leaf_nodes must be at least 2, got {0}")]
    InvalidMaxLeafNodes(usize),
    /// A depth limit of zero forbids every split.
    #[error("max_depth must be at least 1, got {0}")]
    InvalidMaxDepth(usize),
    /// Leaves must hold at least one sample.
    #[error("min_samples_leaf must be at least 1, got {0}")]
    InvalidMinSamplesLeaf(usize),
    /// Regularization terms must be finite and non-negative.
    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidRegularization { field: &'static str, value: f64 },
    /// Shrinkage must be finite and strictly positive.
    #[error("shrinkage must be finite and positive, got {0}")]
    InvalidShrinkage(f64),
    /// The grower needs room for at least one pending histogram.
    #[error("max_cached_histograms must be at least 1, got {0}")]
    InvalidHistogramCacheSize(usize),
}

/// Errors raised by histboost.
///
/// Validation errors are raised before any work starts (bad parameters,
/// malformed inputs). Consistency errors mean the arrays handed to the grower
/// disagree with each other; growth cannot continue meaningfully after one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A parameter group failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input has no samples or no features.
    #[error("input must have at least one sample and one feature, got shape ({n_samples}, {n_features})")]
    EmptyInput { n_samples: usize, n_features: usize },

    /// Input carries a different number of features than the fitted model.
    #[error("expected {expected} features, got {found}")]
    FeatureCountMismatch { expected: usize, found: usize },

    /// A raw feature value is infinite.
    #[error("non-finite value {value} at row {row}, feature {feature}")]
    NonFiniteValue { row: usize, feature: usize, value: f64 },

    /// Row indices are stored as `u32`.
    #[error("at most {max} samples are supported, got {n_samples}")]
    TooManySamples { n_samples: usize, max: usize },

    /// Two arrays that must describe the same samples disagree in length.
    #[error("{what} has length {found}, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// A binned value lies outside the bins declared for its feature.
    #[error(
        "bin {bin} at row {row}, feature {feature} is out of range \
         (feature has {n_bins} bins, missing bin is {missing_bin})"
    )]
    BinOutOfRange {
        row: usize,
        feature: usize,
        bin: u8,
        n_bins: usize,
        missing_bin: u8,
    },

    /// The threshold table handed to the compile step does not cover a split.
    #[error("split on feature {feature} at bin {bin} has no threshold ({n_thresholds} thresholds available)")]
    ThresholdMismatch {
        feature: usize,
        bin: u8,
        n_thresholds: usize,
    },

    /// `grow()` was called on a grower that already finished.
    #[error("tree has already been grown")]
    AlreadyGrown,

    /// The tree must be grown before it can be compiled.
    #[error("tree has not been grown yet")]
    NotGrown,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
