//! Feature data: quantile binning of raw matrices.
//!
//! Raw features are `f64` matrices with `NaN` marking missing values; binned
//! features are `u8` matrices produced by [`BinMapper`].

pub mod binned;

pub use binned::{BinLayout, BinMapper, BinnedMatrix, BinningParams, FeatureBins, FeatureView, MAX_BINS};
