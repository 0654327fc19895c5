//! Missing-value routing.
//!
//! Every split's missing direction is checked against a brute-force
//! recomputation of both candidate gains from the node's rows.

use histboost::testing::data::{inject_missing, least_squares_gradients, random_dense_f64, regression_targets_steps};
use histboost::training::{GainParams, GradientSums, GrowerParams, TreeGrower};
use histboost::{BinMapper, BinningParams};

/// Sums of the node rows matching `keep`.
fn sums(rows: &[u32], gradients: &[f32], keep: impl Fn(usize) -> bool) -> GradientSums {
    rows.iter()
        .map(|&r| r as usize)
        .filter(|&r| keep(r))
        .fold(GradientSums::default(), |mut acc, r| {
            acc.sum_gradients += gradients[r] as f64;
            acc.sum_hessians += 1.0;
            acc.count += 1;
            acc
        })
}

#[test]
fn missing_direction_maximizes_gain() {
    let feature = 0;
    let mut x = random_dense_f64(4000, 3, 31, 0.0, 1.0);
    let missing_rows = inject_missing(&mut x, feature, 0.1, 32);
    let mut y = regression_targets_steps(&x, 33, 0.25);
    // Missing rows score as x <= 0.5; lift them above the right side of the step.
    for &row in &missing_rows {
        y[row] += 2.5;
    }
    let gradients = least_squares_gradients(y.as_slice().unwrap());

    let (mapper, binned) = BinMapper::fit_transform(&BinningParams::default(), x.view()).unwrap();
    assert_eq!(mapper.n_bins_per_feature()[feature], mapper.features()[feature].n_bins_non_missing() + 1);
    let missing_bin = mapper.missing_bin();

    let params = GrowerParams::builder()
        .max_leaf_nodes(31)
        .min_samples_leaf(20)
        .build()
        .unwrap();
    let gain_params: GainParams = params.gain_params();
    let mut grower = TreeGrower::new(binned.view(), &mapper.layout(), &gradients, &[1.0], params).unwrap();
    grower.grow().unwrap();

    let column = binned.column(feature);
    let n_bins_non_missing = mapper.features()[feature].n_bins_non_missing();
    let mut checked = 0;
    for node in grower.nodes() {
        let Some(split) = node.split.as_ref().filter(|s| s.feature == feature) else {
            continue;
        };
        let rows = grower.sample_indices(node.id).unwrap();
        let is_missing = |r: usize| column[r] == missing_bin;
        let missing = sums(rows, &gradients, is_missing);
        if missing.count == 0 {
            continue;
        }

        if split.bin as usize + 1 == n_bins_non_missing {
            // Present-versus-missing split.
            assert!(!split.missing_go_to_left);
            continue;
        }

        let left = sums(rows, &gradients, |r| !is_missing(r) && column[r] <= split.bin);
        let right = sums(rows, &gradients, |r| !is_missing(r) && column[r] > split.bin);
        let parent_score = gain_params.node_score(node.stats.sum_gradients, node.stats.sum_hessians);
        let gain_if = |to_left: bool| {
            let (l, r) = if to_left {
                (left + missing, right)
            } else {
                (left, right + missing)
            };
            gain_params
                .is_valid_split(&l, &r)
                .then(|| gain_params.compute_gain(&l, &r, parent_score))
        };

        let chosen = gain_if(split.missing_go_to_left).expect("chosen split is valid");
        assert!((chosen - split.gain).abs() < 1e-6, "chosen {chosen} vs recorded {}", split.gain);
        if let Some(other) = gain_if(!split.missing_go_to_left) {
            assert!(chosen >= other - 1e-9, "missing direction lost gain: {chosen} < {other}");
        }
        checked += 1;
    }
    assert!(checked > 0, "no split on the missing feature held missing samples");
}

#[test]
fn missing_values_follow_split_direction_at_prediction() {
    let mut x = random_dense_f64(2000, 2, 41, 0.0, 1.0);
    inject_missing(&mut x, 1, 0.2, 42);
    let y = regression_targets_steps(&x, 43, 0.1);
    let gradients = least_squares_gradients(y.as_slice().unwrap());

    let (mapper, binned) = BinMapper::fit_transform(&BinningParams::default(), x.view()).unwrap();
    let params = GrowerParams::builder().max_leaf_nodes(8).build().unwrap();
    let mut grower = TreeGrower::new(binned.view(), &mapper.layout(), &gradients, &[1.0], params).unwrap();
    grower.grow().unwrap();
    let predictor = grower.make_predictor(mapper.features()).unwrap();

    let raw = predictor.predict(x.view()).unwrap();
    let fitted = grower.training_predictions().unwrap();
    assert_eq!(raw, fitted);

    // Unseen rows with every value missing still reach a leaf.
    let value = predictor.predict_row(&[f64::NAN, f64::NAN]);
    assert!(predictor.nodes().iter().any(|n| n.is_leaf && n.value == value));
}

#[test]
fn single_present_bin_splits_present_from_missing() {
    // One distinct value plus missing: the only possible split.
    let n = 200;
    let x = ndarray::Array2::from_shape_fn((n, 1), |(i, _)| if i % 4 == 0 { f64::NAN } else { 1.0 });
    let y: Vec<f64> = (0..n).map(|i| if i % 4 == 0 { 5.0 } else { 0.0 }).collect();
    let gradients = least_squares_gradients(&y);

    let (mapper, binned) = BinMapper::fit_transform(&BinningParams::default(), x.view()).unwrap();
    assert_eq!(mapper.n_bins_per_feature(), vec![2]);

    let params = GrowerParams::builder().min_samples_leaf(1).build().unwrap();
    let mut grower = TreeGrower::new(binned.view(), &mapper.layout(), &gradients, &[1.0], params).unwrap();
    grower.grow().unwrap();
    assert_eq!(grower.n_leaves(), 2);

    let split = grower.nodes()[0].split.clone().unwrap();
    assert_eq!(split.bin, 0);
    assert!(!split.missing_go_to_left);

    let predictor = grower.make_predictor(mapper.features()).unwrap();
    assert_eq!(predictor.nodes()[0].threshold, f64::INFINITY);
    let mean = 5.0 * 50.0 / 200.0;
    assert!((predictor.predict_row(&[1.0]) - (0.0 - mean)).abs() < 1e-6);
    assert!((predictor.predict_row(&[f64::NAN]) - (5.0 - mean)).abs() < 1e-6);
    assert!((predictor.predict_row(&[1e9]) - (0.0 - mean)).abs() < 1e-6);
}
