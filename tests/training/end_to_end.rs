//! Bin, grow, compile and predict on held-out data.

use histboost::testing::data::{random_dense_f64, regression_targets_linear, regression_targets_steps};
use histboost::testing::mean_squared_error;
use histboost::training::GrowerParams;
use histboost::BinningParams;
use ndarray::Array1;

use crate::common::Problem;

fn held_out_mse(problem: &Problem, x_test: &ndarray::Array2<f64>, y_test: &Array1<f64>) -> (f64, f64) {
    let params = GrowerParams::builder()
        .max_leaf_nodes(31)
        .min_samples_leaf(20)
        .build()
        .unwrap();
    let grower = problem.grow(params);
    assert!(grower.n_leaves() <= 31);
    let predictor = grower.make_predictor(problem.mapper.features()).unwrap();

    let mean = problem.mean();
    let predictions: Vec<f64> = predictor
        .predict(x_test.view())
        .unwrap()
        .iter()
        .map(|p| mean + p)
        .collect();
    let baseline = vec![mean; y_test.len()];
    let targets = y_test.as_slice().unwrap();
    (
        mean_squared_error(&predictions, targets),
        mean_squared_error(&baseline, targets),
    )
}

#[test]
fn tree_beats_constant_mean_on_step_targets() {
    let x = random_dense_f64(1000, 5, 100, 0.0, 1.0);
    let y = regression_targets_steps(&x, 101, 0.25);
    let binning = BinningParams::builder().max_bins(256).build().unwrap();
    let problem = Problem::binned_with(&binning, x, y);
    assert_eq!(problem.mapper.missing_bin(), 255);

    let x_test = random_dense_f64(500, 5, 200, 0.0, 1.0);
    let y_test = regression_targets_steps(&x_test, 201, 0.25);
    let (tree, baseline) = held_out_mse(&problem, &x_test, &y_test);
    assert!(tree < baseline, "tree mse {tree} >= baseline {baseline}");
    assert!(tree < 0.5 * baseline);
}

#[test]
fn tree_beats_constant_mean_on_linear_targets() {
    let x = random_dense_f64(1000, 5, 300, -1.0, 1.0);
    let (y, weights, bias) = regression_targets_linear(&x, 301, 0.05);
    let problem = Problem::from_raw(x, y);

    let x_test = random_dense_f64(500, 5, 400, -1.0, 1.0);
    let y_test: Array1<f64> = x_test
        .rows()
        .into_iter()
        .map(|row| bias + row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>())
        .collect();
    let (tree, baseline) = held_out_mse(&problem, &x_test, &y_test);
    assert!(tree < baseline, "tree mse {tree} >= baseline {baseline}");
}

#[test]
fn growth_stats_account_for_every_split() {
    let problem = Problem::steps(1000, 5, 500);
    let grower = problem.grow(GrowerParams::builder().max_leaf_nodes(31).build().unwrap());
    let stats = grower.stats();

    assert_eq!(stats.n_splits, grower.n_leaves() - 1);
    // One subtraction per split with a splittable child, plus the root build.
    assert_eq!(stats.n_histograms_built, stats.n_histograms_subtracted + 1);
    assert!(stats.n_histograms_subtracted <= stats.n_splits);
    assert_eq!(stats.n_histograms_evicted, 0);
    assert!(stats.total_time >= stats.histogram_time);
}
