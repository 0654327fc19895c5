//! Tree growth parameters with builder pattern.
//!
//! # Example
//!
//! ```
//! use histboost::training::GrowerParams;
//!
//! // All defaults: unlimited leaves and depth, 20 samples per leaf
//! let params = GrowerParams::builder().build().unwrap();
//!
//! let params = GrowerParams::builder()
//!     .max_leaf_nodes(31)
//!     .min_samples_leaf(20)
//!     .l2_regularization(1.0)
//!     .build()
//!     .unwrap();
//! assert_eq!(params.max_leaf_nodes, Some(31));
//! ```

use bon::Builder;

use super::split::GainParams;
use crate::error::ConfigError;

/// Parameters controlling the growth of a single tree.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct GrowerParams {
    /// Maximum number of leaves. `None` for no limit.
    pub max_leaf_nodes: Option<usize>,

    /// Maximum depth of a leaf (the root has depth 0). `None` for no limit.
    pub max_depth: Option<usize>,

    /// Minimum number of samples per leaf. Default: 20.
    #[builder(default = 20)]
    pub min_samples_leaf: usize,

    /// Each child of a split needs a hessian sum above this. Default: 1e-3.
    #[builder(default = 1e-3)]
    pub min_hessian_to_split: f64,

    /// L2 regularization (lambda) on leaf values. Default: 0.
    #[builder(default = 0.0)]
    pub l2_regularization: f64,

    /// Penalty (gamma) subtracted from every split gain. Default: 0.
    #[builder(default = 0.0)]
    pub min_gain_to_split: f64,

    /// Factor applied to every leaf value. Default: 1.
    #[builder(default = 1.0)]
    pub shrinkage: f64,

    /// Histograms of pending leaves kept for the subtraction trick. Leaves
    /// whose histogram was evicted get both children built from rows.
    /// Default: 64.
    #[builder(default = 64)]
    pub max_cached_histograms: usize,
}

impl Default for GrowerParams {
    fn default() -> Self {
        Self::builder().__build_internal()
    }
}

/// Custom finishing function that validates the parameters.
impl<S: grower_params_builder::IsComplete> GrowerParamsBuilder<S> {
    /// Build and validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any parameter is invalid:
    /// - `max_leaf_nodes < 2`
    /// - `max_depth == 0`
    /// - `min_samples_leaf == 0`
    /// - Negative or non-finite regularization terms
    /// - `shrinkage <= 0`
    /// - `max_cached_histograms == 0`
    pub fn build(self) -> Result<GrowerParams, ConfigError> {
        let params = self.__build_internal();
        params.validate()?;
        Ok(params)
    }
}

impl GrowerParams {
    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(n) = self.max_leaf_nodes {
            if n < 2 {
                return Err(ConfigError::InvalidMaxLeafNodes(n));
            }
        }
        if self.max_depth == Some(0) {
            return Err(ConfigError::InvalidMaxDepth(0));
        }
        if self.min_samples_leaf == 0 || self.min_samples_leaf > u32::MAX as usize {
            return Err(ConfigError::InvalidMinSamplesLeaf(self.min_samples_leaf));
        }

        let non_negative = [
            ("min_hessian_to_split", self.min_hessian_to_split),
            ("l2_regularization", self.l2_regularization),
            ("min_gain_to_split", self.min_gain_to_split),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRegularization { field, value });
            }
        }

        if !self.shrinkage.is_finite() || self.shrinkage <= 0.0 {
            return Err(ConfigError::InvalidShrinkage(self.shrinkage));
        }
        if self.max_cached_histograms == 0 {
            return Err(ConfigError::InvalidHistogramCacheSize(0));
        }
        Ok(())
    }

    /// Parameters of the split search.
    pub fn gain_params(&self) -> GainParams {
        GainParams {
            l2_regularization: self.l2_regularization,
            min_gain_to_split: self.min_gain_to_split,
            min_hessian_to_split: self.min_hessian_to_split,
            min_samples_leaf: self.min_samples_leaf as u32,
        }
    }
}
