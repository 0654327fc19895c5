//! histboost: histogram-based gradient boosting tree induction.
//!
//! Three components used in sequence by a boosting driver:
//!
//! 1. [`BinMapper`] discretizes raw `f64` features into at most 255 quantile
//!    bins plus a missing-value bin.
//! 2. [`TreeGrower`] grows one regression tree leaf-wise from the binned
//!    matrix and per-sample gradients and hessians.
//! 3. [`Predictor`] is the compiled tree, evaluated on raw or binned rows.
//!
//! ```
//! use histboost::{BinMapper, BinningParams, GrowerParams, TreeGrower};
//! use histboost::testing::data::{least_squares_gradients, random_dense_f64, regression_targets_steps};
//!
//! let x = random_dense_f64(500, 3, 0, 0.0, 1.0);
//! let y = regression_targets_steps(&x, 1, 0.1);
//! let gradients = least_squares_gradients(y.as_slice().unwrap());
//!
//! let (mapper, binned) = BinMapper::fit_transform(&BinningParams::default(), x.view())?;
//! let params = GrowerParams::builder().max_leaf_nodes(8).build()?;
//! let mut grower = TreeGrower::new(binned.view(), &mapper.layout(), &gradients, &[1.0], params)?;
//! grower.grow()?;
//!
//! let predictor = grower.make_predictor(mapper.features())?;
//! assert!(predictor.n_leaves() <= 8);
//! # Ok::<(), histboost::Error>(())
//! ```

pub mod data;
pub mod error;
pub mod inference;
pub mod testing;
pub mod training;

// Re-export approx traits for users who want to use assert_relative_eq! etc.
pub use approx;

pub use data::{BinLayout, BinMapper, BinningParams, FeatureBins, MAX_BINS};
pub use error::{ConfigError, Error, Result};
pub use inference::{Predictor, PredictorNode};
pub use training::{GrowerParams, TreeGrower};
