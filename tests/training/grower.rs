//! Tree grower integration tests.
//!
//! Focused on growth invariants: partition, conservation, constraints,
//! expansion order, determinism and compile-equivalence.

use histboost::testing::data::random_binned;
use histboost::training::{GrowerParams, TreeGrower, TreeNode};
use histboost::{BinLayout, ConfigError, Error};
use ndarray::{Array2, Axis};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

use crate::common::{Problem, assert_approx_eq};

const N_BINS: [usize; 3] = [8, 3, 20];

fn random_gradients(n: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

fn layout() -> BinLayout {
    BinLayout::new(N_BINS.to_vec(), 255).unwrap()
}

/// Rows of a node, sorted.
fn rows_of(grower: &TreeGrower<'_>, node: &TreeNode) -> Vec<u32> {
    let mut rows = grower.sample_indices(node.id).unwrap().to_vec();
    rows.sort_unstable();
    rows
}

/// Replay expansion over a fully grown tree, always splitting the open node
/// with the highest gain. Returns rows and gain of each split, in order.
fn best_first_replay(grower: &TreeGrower<'_>, n_splits: usize) -> Vec<(Vec<u32>, f64)> {
    let nodes = grower.nodes();
    let mut open = vec![0u32];
    let mut order = Vec::with_capacity(n_splits);
    while order.len() < n_splits {
        let best = open
            .iter()
            .enumerate()
            .filter_map(|(pos, &id)| nodes[id as usize].gain().map(|gain| (pos, gain)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        let Some((pos, gain)) = best else {
            break;
        };
        let node = &nodes[open.swap_remove(pos) as usize];
        order.push((rows_of(grower, node), gain));
        let (left, right) = node.children().unwrap();
        open.extend([left, right]);
    }
    order
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Leaves partition the samples; splits conserve counts and sums and
    /// respect the leaf budget and minimum leaf size.
    #[test]
    fn growth_invariants(
        seed in any::<u64>(),
        n_samples in 40usize..400,
        max_leaf_nodes in 2usize..24,
        min_samples_leaf in 1usize..15,
    ) {
        let binned = random_binned(n_samples, &N_BINS, seed);
        let gradients = random_gradients(n_samples, seed ^ 0x5eed);
        let params = GrowerParams::builder()
            .max_leaf_nodes(max_leaf_nodes)
            .min_samples_leaf(min_samples_leaf)
            .build()
            .unwrap();
        let mut grower = TreeGrower::new(binned.view(), &layout(), &gradients, &[1.0], params).unwrap();
        grower.grow().unwrap();

        prop_assert!(grower.n_leaves() <= max_leaf_nodes);
        prop_assert_eq!(grower.n_nodes(), 2 * grower.n_leaves() - 1);

        let mut rows: Vec<u32> = Vec::with_capacity(n_samples);
        for node in grower.nodes() {
            prop_assert!(node.n_samples() >= min_samples_leaf);
            match node.children() {
                None => rows.extend_from_slice(grower.sample_indices(node.id).unwrap()),
                Some((left, right)) => {
                    let left = &grower.nodes()[left as usize].stats;
                    let right = &grower.nodes()[right as usize].stats;
                    prop_assert_eq!(left.count + right.count, node.stats.count);
                    prop_assert!((left.sum_gradients + right.sum_gradients - node.stats.sum_gradients).abs() < 1e-6);
                    prop_assert!((left.sum_hessians + right.sum_hessians - node.stats.sum_hessians).abs() < 1e-9);
                }
            }
        }
        rows.sort_unstable();
        prop_assert_eq!(rows, (0..n_samples as u32).collect::<Vec<_>>());
    }
}

#[test]
fn growth_expands_highest_gain_leaf_first() {
    let problem = Problem::steps(2000, 4, 29);
    // A cache large enough that every histogram comes from the same
    // subtraction chain in both trees.
    let params = |max_leaf_nodes: Option<usize>| {
        GrowerParams::builder()
            .maybe_max_leaf_nodes(max_leaf_nodes)
            .min_samples_leaf(10)
            .max_cached_histograms(4096)
            .build()
            .unwrap()
    };
    let full = problem.grow(params(None));
    assert!(full.n_leaves() > 24);

    for max_leaf_nodes in [2, 5, 12, 24] {
        let budgeted = problem.grow(params(Some(max_leaf_nodes)));
        // Children ids follow split order.
        let mut applied: Vec<&TreeNode> = budgeted.nodes().iter().filter(|n| !n.is_leaf()).collect();
        applied.sort_by_key(|n| n.left_child);
        assert_eq!(applied.len(), max_leaf_nodes - 1);

        let expected = best_first_replay(&full, applied.len());
        assert_eq!(expected.len(), applied.len());
        for (step, (node, (rows, gain))) in applied.iter().zip(&expected).enumerate() {
            assert_eq!(&rows_of(&budgeted, node), rows, "split {step} with {max_leaf_nodes} leaves");
            assert_eq!(node.gain(), Some(*gain), "split {step} with {max_leaf_nodes} leaves");
        }
    }
}

#[test]
fn compiled_predictor_matches_direct_traversal() {
    let problem = Problem::steps(1500, 4, 11);
    let grower = problem.grow(GrowerParams::builder().max_leaf_nodes(31).build().unwrap());
    let predictor = grower.make_predictor(problem.mapper.features()).unwrap();

    let from_partition = grower.training_predictions().unwrap();
    let binned = predictor
        .predict_binned(problem.binned.view(), problem.mapper.missing_bin())
        .unwrap();
    let raw = predictor.predict(problem.x.view()).unwrap();
    let par = predictor.par_predict(problem.x.view()).unwrap();

    for (i, row) in problem.binned.axis_iter(Axis(0)).enumerate() {
        let direct = grower.predict_binned_row(row).unwrap();
        assert_eq!(direct, from_partition[i], "row {i}");
        assert_eq!(direct, binned[i], "row {i}");
        assert_eq!(direct, raw[i], "row {i}");
    }
    assert_eq!(raw, par);
}

#[test]
fn predictor_outlives_grower_and_training_data() {
    let predictor = {
        let problem = Problem::steps(600, 2, 3);
        let grower = problem.grow(GrowerParams::builder().max_leaf_nodes(4).build().unwrap());
        grower.make_predictor(problem.mapper.features()).unwrap()
    };
    assert!(predictor.n_leaves() <= 4);
    let value = predictor.predict_row(&[0.9, 0.9]);
    assert!(value.is_finite());
}

#[test]
fn growth_is_deterministic_across_thread_counts() {
    let problem = Problem::steps(3000, 20, 5);
    let params = GrowerParams::builder().max_leaf_nodes(25).min_samples_leaf(10).build().unwrap();

    let parallel = problem.grow(params.clone());
    let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let sequential = pool.install(|| problem.grow(params.clone()));
    let again = problem.grow(params);

    assert_eq!(parallel.nodes(), sequential.nodes());
    assert_eq!(parallel.nodes(), again.nodes());
}

#[test]
fn constant_hessian_matches_full_hessian() {
    let n = 800;
    let binned = random_binned(n, &N_BINS, 21);
    let gradients = random_gradients(n, 22);
    let params = GrowerParams::builder().max_leaf_nodes(16).min_samples_leaf(5).build().unwrap();

    for constant in [1.0f32, 0.5, 2.0] {
        let full = vec![constant; n];
        let constant_hessian = [constant];
        let mut fast = TreeGrower::new(binned.view(), &layout(), &gradients, &constant_hessian, params.clone()).unwrap();
        let mut slow = TreeGrower::new(binned.view(), &layout(), &gradients, &full, params.clone()).unwrap();
        fast.grow().unwrap();
        slow.grow().unwrap();

        assert_eq!(fast.nodes(), slow.nodes(), "hessian {constant}");
        assert_eq!(fast.stats().n_histograms_built, slow.stats().n_histograms_built);
    }
}

#[test]
fn max_depth_limits_leaves_depth() {
    let problem = Problem::steps(2000, 3, 8);
    let grower = problem.grow(
        GrowerParams::builder()
            .max_depth(3)
            .min_samples_leaf(5)
            .build()
            .unwrap(),
    );
    assert!(grower.max_depth() <= 3);
    assert!(grower.n_leaves() <= 8);
    let predictor = grower.make_predictor(problem.mapper.features()).unwrap();
    assert_eq!(predictor.max_depth() as usize, grower.max_depth());
}

#[test]
fn gamma_prunes_weak_splits() {
    let problem = Problem::steps(1000, 3, 13);
    let loose = problem.grow(GrowerParams::builder().min_samples_leaf(5).build().unwrap());
    let strict = problem.grow(
        GrowerParams::builder()
            .min_samples_leaf(5)
            .min_gain_to_split(50.0)
            .build()
            .unwrap(),
    );
    assert!(strict.n_leaves() < loose.n_leaves());
    assert!(strict.nodes().iter().filter_map(|n| n.gain()).all(|g| g > 0.0));
}

#[test]
fn l2_regularization_shrinks_leaf_values() {
    let problem = Problem::steps(500, 2, 17);
    let grower = problem.grow(
        GrowerParams::builder()
            .max_leaf_nodes(2)
            .l2_regularization(100.0)
            .build()
            .unwrap(),
    );
    assert_eq!(grower.n_leaves(), 2);
    for node in grower.nodes().iter().filter(|n| n.is_leaf()) {
        let newton = -node.stats.sum_gradients / node.stats.sum_hessians;
        let expected = -node.stats.sum_gradients / (node.stats.sum_hessians + 100.0);
        assert_approx_eq!(node.value, expected, 1e-12);
        assert!(node.value.abs() < newton.abs());
    }
}

#[test]
fn rejects_invalid_parameters_before_growth() {
    assert_eq!(
        GrowerParams::builder().max_leaf_nodes(1).build().unwrap_err(),
        ConfigError::InvalidMaxLeafNodes(1)
    );
    assert_eq!(
        GrowerParams::builder().min_samples_leaf(0).build().unwrap_err(),
        ConfigError::InvalidMinSamplesLeaf(0)
    );

    // Struct-literal params bypass the builder; the grower still checks them.
    let params = GrowerParams {
        max_leaf_nodes: Some(0),
        ..GrowerParams::default()
    };
    let binned = Array2::<u8>::zeros((4, 3));
    let gradients = [0.0f32; 4];
    assert_eq!(
        TreeGrower::new(binned.view(), &layout(), &gradients, &[1.0], params).err(),
        Some(Error::Config(ConfigError::InvalidMaxLeafNodes(0)))
    );
}

#[test]
fn rejects_inconsistent_binned_matrix() {
    let mut binned = random_binned(50, &N_BINS, 1);
    binned[[17, 1]] = 3;
    let gradients = random_gradients(50, 2);
    let err = TreeGrower::new(binned.view(), &layout(), &gradients, &[1.0], GrowerParams::default())
        .err()
        .unwrap();
    assert_eq!(
        err,
        Error::BinOutOfRange {
            row: 17,
            feature: 1,
            bin: 3,
            n_bins: 3,
            missing_bin: 255
        }
    );
    assert!(err.to_string().contains("row 17"));
}

#[test]
fn rejects_mismatched_lengths() {
    let binned = random_binned(50, &N_BINS, 1);
    let gradients = random_gradients(49, 2);
    assert!(matches!(
        TreeGrower::new(binned.view(), &layout(), &gradients, &[1.0], GrowerParams::default()),
        Err(Error::LengthMismatch { what: "gradients", expected: 50, found: 49 })
    ));

    let gradients = random_gradients(50, 2);
    let hessians = vec![1.0f32; 10];
    assert!(matches!(
        TreeGrower::new(binned.view(), &layout(), &gradients, &hessians, GrowerParams::default()),
        Err(Error::LengthMismatch { what: "hessians", expected: 50, found: 10 })
    ));

    let wide = random_binned(50, &[8, 3, 20, 4], 1);
    assert!(matches!(
        TreeGrower::new(wide.view(), &layout(), &gradients, &[1.0], GrowerParams::default()),
        Err(Error::FeatureCountMismatch { expected: 3, found: 4 })
    ));
}
