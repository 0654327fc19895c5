//! Regression tree inference.
//!
//! - [`Predictor`]: Flat compiled tree with raw and binned prediction
//! - [`PredictorNode`]: One compiled node

mod predictor;

pub use predictor::{Predictor, PredictorNode};
