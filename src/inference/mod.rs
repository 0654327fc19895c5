//! Inference for trained trees.
//!
//! # Module Structure
//!
//! - [`gbdt`]: Compiled tree predictor

pub mod gbdt;

pub use gbdt::{Predictor, PredictorNode};
