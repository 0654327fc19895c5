//! Deterministic synthetic datasets.

use ndarray::{Array1, Array2};
use rand::prelude::*;

/// Generate random features, uniform in `[min, max]`, shape `(rows, cols)`.
pub fn random_dense_f64(rows: usize, cols: usize, seed: u64, min: f64, max: f64) -> Array2<f64> {
	assert!(max >= min);
	let mut rng = StdRng::seed_from_u64(seed);
	let width = max - min;
	Array2::from_shape_simple_fn((rows, cols), || min + rng.r#gen::<f64>() * width)
}

/// Generate random bins, column `f` uniform in `0..n_bins[f]`.
pub fn random_binned(rows: usize, n_bins: &[usize], seed: u64) -> Array2<u8> {
	assert!(n_bins.iter().all(|&n| (1..=255).contains(&n)));
	let mut rng = StdRng::seed_from_u64(seed);
	let mut binned = Array2::zeros((rows, n_bins.len()));
	for mut row in binned.rows_mut() {
		for (bin, &n) in row.iter_mut().zip(n_bins) {
			*bin = rng.gen_range(0..n) as u8;
		}
	}
	binned
}

/// Generate regression targets as a linear model of features plus uniform noise.
///
/// Returns `(targets, weights, bias)`.
pub fn regression_targets_linear(
	features: &Array2<f64>,
	seed: u64,
	noise_amplitude: f64,
) -> (Array1<f64>, Vec<f64>, f64) {
	let mut rng = StdRng::seed_from_u64(seed);

	let weights: Vec<f64> = (0..features.ncols()).map(|_| rng.r#gen::<f64>() * 2.0 - 1.0).collect();
	let bias: f64 = rng.r#gen::<f64>() * 0.5 - 0.25;

	let targets = features
		.rows()
		.into_iter()
		.map(|row| {
			let mut y = bias;
			for (x, w) in row.iter().zip(&weights) {
				y += x * w;
			}
			if noise_amplitude > 0.0 {
				y += (rng.r#gen::<f64>() * 2.0 - 1.0) * noise_amplitude;
			}
			y
		})
		.collect();

	(targets, weights, bias)
}

/// Generate targets with a step in every feature, which a tree fits well.
///
/// `y = sum_f sign(x_f - 0.5) * (f + 1) + noise`, features expected in `[0, 1]`.
pub fn regression_targets_steps(features: &Array2<f64>, seed: u64, noise_amplitude: f64) -> Array1<f64> {
	let mut rng = StdRng::seed_from_u64(seed);
	features
		.rows()
		.into_iter()
		.map(|row| {
			let signal: f64 = row
				.iter()
				.enumerate()
				.map(|(f, &x)| if x > 0.5 { (f + 1) as f64 } else { -((f + 1) as f64) })
				.sum();
			signal + (rng.r#gen::<f64>() * 2.0 - 1.0) * noise_amplitude
		})
		.collect()
}

/// Least-squares gradients at the constant-mean prediction: `-(y - mean(y))`.
pub fn least_squares_gradients(targets: &[f64]) -> Vec<f32> {
	let mean = targets.iter().sum::<f64>() / targets.len().max(1) as f64;
	targets.iter().map(|&y| (mean - y) as f32).collect()
}

/// Replace a fraction of one feature's values with `NaN`.
///
/// Returns the rows that were blanked, ascending.
pub fn inject_missing(features: &mut Array2<f64>, feature: usize, fraction: f64, seed: u64) -> Vec<usize> {
	assert!((0.0..=1.0).contains(&fraction));
	let rows = features.nrows();
	let mut rng = StdRng::seed_from_u64(seed);
	let n_missing = ((rows as f64) * fraction).round() as usize;
	let mut missing = rand::seq::index::sample(&mut rng, rows, n_missing).into_vec();
	missing.sort_unstable();
	for &row in &missing {
		features[[row, feature]] = f64::NAN;
	}
	missing
}

/// Deterministic train/valid split indices.
///
/// Returns `(train_idx, valid_idx)`.
pub fn split_indices(rows: usize, valid_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
	assert!((0.0..1.0).contains(&valid_fraction));
	let mut idx: Vec<usize> = (0..rows).collect();
	let mut rng = StdRng::seed_from_u64(seed);
	idx.shuffle(&mut rng);

	let valid_len = ((rows as f64) * valid_fraction).round() as usize;
	let valid_len = valid_len.min(rows);
	let (valid, train) = idx.split_at(valid_len);
	(train.to_vec(), valid.to_vec())
}
