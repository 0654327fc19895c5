//! Compiled tree predictor.
//!
//! A [`Predictor`] is a flat array of [`PredictorNode`]s produced by
//! [`TreeGrower::make_predictor`](crate::training::TreeGrower::make_predictor).
//! Node 0 is the root. Split nodes compare a raw feature value against the
//! threshold recovered from the bin boundaries, so prediction works on
//! unbinned data.
//!
//! # Thresholds
//!
//! A split at bin `b` sends regular bins `0..=b` left. With thresholds
//! `t`, a raw value `x` lands in a bin `<= b` exactly when `x <= t[b]`, so the
//! compiled comparison is `x <= t[b]`. A split at the last regular bin only
//! separates present from missing values and gets threshold `+inf`.

use ndarray::{Array1, ArrayView1, ArrayView2, Zip};

use crate::error::{Error, Result};

// =============================================================================
// PredictorNode
// =============================================================================

/// A compiled tree node.
///
/// Uses struct layout (not enum) for fixed-size nodes in a flat array. The
/// `is_leaf` flag distinguishes split from leaf nodes; split fields are
/// meaningless on leaves.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictorNode {
    /// Leaf value; on split nodes, the value the node had as a leaf.
    pub value: f64,
    /// Number of training samples that reached this node.
    pub count: u32,
    /// Feature index for split.
    pub feature_idx: u32,
    /// Raw threshold: values `<= threshold` go left.
    pub threshold: f64,
    /// Bin threshold: bins `<= bin_threshold` go left.
    pub bin_threshold: u8,
    /// Direction for missing values.
    pub missing_go_to_left: bool,
    /// Index of the left child.
    pub left: u32,
    /// Index of the right child.
    pub right: u32,
    /// Gain of the split.
    pub gain: f64,
    /// Distance from the root.
    pub depth: u32,
    /// Whether this is a leaf node.
    pub is_leaf: bool,
}

impl PredictorNode {
    /// Create a leaf node.
    pub fn leaf(value: f64, count: u32, depth: u32) -> Self {
        Self {
            value,
            count,
            feature_idx: 0,
            threshold: f64::NAN,
            bin_threshold: 0,
            missing_go_to_left: false,
            left: 0,
            right: 0,
            gain: 0.0,
            depth,
            is_leaf: true,
        }
    }

    /// Create a split node. Children are linked afterwards.
    pub fn split(
        feature_idx: u32,
        threshold: f64,
        bin_threshold: u8,
        missing_go_to_left: bool,
        gain: f64,
        leaf: Self,
    ) -> Self {
        Self {
            feature_idx,
            threshold,
            bin_threshold,
            missing_go_to_left,
            gain,
            is_leaf: false,
            ..leaf
        }
    }

    /// Whether a raw value goes left. `NaN` is missing.
    #[inline]
    pub fn goes_left(&self, value: f64) -> bool {
        if value.is_nan() {
            self.missing_go_to_left
        } else {
            value <= self.threshold
        }
    }

    /// Whether a binned value goes left.
    #[inline]
    pub fn goes_left_binned(&self, bin: u8, missing_bin: u8) -> bool {
        if bin == missing_bin {
            self.missing_go_to_left
        } else {
            bin <= self.bin_threshold
        }
    }
}

// =============================================================================
// Predictor
// =============================================================================

/// Immutable compiled regression tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Predictor {
    nodes: Box<[PredictorNode]>,
    n_features: usize,
}

impl Predictor {
    /// Wrap compiled nodes. Node 0 must be the root and every split node must
    /// link to valid children.
    pub(crate) fn new(nodes: Vec<PredictorNode>, n_features: usize) -> Self {
        debug_assert!(!nodes.is_empty());
        debug_assert!(nodes.iter().all(|n| n.is_leaf
            || ((n.left as usize) < nodes.len() && (n.right as usize) < nodes.len())));
        Self {
            nodes: nodes.into_boxed_slice(),
            n_features,
        }
    }

    /// Compiled nodes, root first.
    #[inline]
    pub fn nodes(&self) -> &[PredictorNode] {
        &self.nodes
    }

    /// Number of features the tree was grown on.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf).count()
    }

    /// Depth of the deepest leaf.
    pub fn max_depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Walk from the root to a leaf.
    #[inline]
    fn traverse(&self, mut goes_left: impl FnMut(&PredictorNode) -> bool) -> f64 {
        let mut node = &self.nodes[0];
        while !node.is_leaf {
            let next = if goes_left(node) { node.left } else { node.right };
            node = &self.nodes[next as usize];
        }
        node.value
    }

    /// Predict one row of raw features. `NaN` marks a missing value, and so
    /// does a feature index beyond the end of `features`.
    #[inline]
    pub fn predict_row(&self, features: &[f64]) -> f64 {
        self.traverse(|node| {
            let value = features.get(node.feature_idx as usize).copied().unwrap_or(f64::NAN);
            node.goes_left(value)
        })
    }

    #[inline]
    fn predict_row_view(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.traverse(|node| node.goes_left(row[node.feature_idx as usize]))
    }

    fn check_features(&self, found: usize) -> Result<()> {
        if found != self.n_features {
            return Err(Error::FeatureCountMismatch {
                expected: self.n_features,
                found,
            });
        }
        Ok(())
    }

    /// Predict raw feature rows, `(n_samples, n_features)`.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        self.check_features(x.ncols())?;
        Ok(x.rows().into_iter().map(|row| self.predict_row_view(row)).collect())
    }

    /// Parallel version of [`predict`](Self::predict), rows split across the
    /// rayon pool.
    pub fn par_predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        self.check_features(x.ncols())?;
        let mut out = Array1::zeros(x.nrows());
        Zip::from(&mut out)
            .and(x.rows())
            .par_for_each(|out, row| *out = self.predict_row_view(row));
        Ok(out)
    }

    /// Predict already-binned rows, following bin thresholds instead of raw
    /// thresholds.
    pub fn predict_binned(&self, binned: ArrayView2<'_, u8>, missing_bin: u8) -> Result<Array1<f64>> {
        self.check_features(binned.ncols())?;
        Ok(binned
            .rows()
            .into_iter()
            .map(|row| {
                self.traverse(|node| node.goes_left_binned(row[node.feature_idx as usize], missing_bin))
            })
            .collect())
    }
}
