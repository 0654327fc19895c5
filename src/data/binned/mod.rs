//! Quantile binning and binned-matrix metadata.
//!
//! # Bin encoding
//!
//! ```text
//! thresholds:  [t0, t1, t2]
//! bin 0: x <= t0
//! bin 1: t0 < x <= t1
//! bin 2: t1 < x <= t2
//! bin 3: x > t2
//! missing (NaN): max_bins (shared by all features)
//! ```
//!
//! The encoding is monotonic: `x1 <= x2` implies `bin(x1) <= bin(x2)`, and
//! `bin(x) <= b` holds exactly when `x <= t[b]`. The predictor relies on the
//! second property to turn bin-space splits back into raw thresholds.

mod bin_mapper;
mod layout;
mod quantile;

pub use bin_mapper::{BinMapper, BinningParams, FeatureBins, MAX_BINS};
pub use layout::{BinLayout, BinnedMatrix, FeatureView};
