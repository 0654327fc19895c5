//! Shared fixtures for integration tests.
//!
//! For assertion helpers and data generators, use `histboost::testing`.

#![allow(dead_code)]

use histboost::testing::data::{least_squares_gradients, random_dense_f64, regression_targets_steps};
use histboost::{BinMapper, BinningParams, GrowerParams, TreeGrower};
use ndarray::{Array1, Array2};

#[allow(unused_imports)]
pub use histboost::assert_approx_eq;

/// A raw regression problem with its binned form and least-squares gradients.
pub struct Problem {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub mapper: BinMapper,
    pub binned: Array2<u8>,
    pub gradients: Vec<f32>,
}

impl Problem {
    /// Step-shaped targets over uniform features in `[0, 1]`.
    pub fn steps(n_samples: usize, n_features: usize, seed: u64) -> Self {
        let x = random_dense_f64(n_samples, n_features, seed, 0.0, 1.0);
        let y = regression_targets_steps(&x, seed + 1, 0.25);
        Self::from_raw(x, y)
    }

    /// Bin `x` with default parameters and derive gradients from `y`.
    pub fn from_raw(x: Array2<f64>, y: Array1<f64>) -> Self {
        Self::binned_with(&BinningParams::default(), x, y)
    }

    /// Bin `x` with `params` and derive gradients from `y`.
    pub fn binned_with(params: &BinningParams, x: Array2<f64>, y: Array1<f64>) -> Self {
        let (mapper, binned) = BinMapper::fit_transform(params, x.view()).expect("binning failed");
        let gradients = least_squares_gradients(y.as_slice().expect("contiguous targets"));
        Self {
            x,
            y,
            mapper,
            binned,
            gradients,
        }
    }

    /// Grow a tree with unit hessians.
    pub fn grow(&self, params: GrowerParams) -> TreeGrower<'_> {
        let mut grower = TreeGrower::new(
            self.binned.view(),
            &self.mapper.layout(),
            &self.gradients,
            &[1.0],
            params,
        )
        .expect("valid grower inputs");
        grower.grow().expect("first growth");
        grower
    }

    /// Mean of the targets.
    pub fn mean(&self) -> f64 {
        self.y.mean().unwrap_or(0.0)
    }
}
