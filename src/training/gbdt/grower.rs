//! Tree grower for gradient boosting.
//!
//! Grows one regression tree leaf-wise: the leaf whose best split improves
//! the loss most is always split next. Orchestrates histogram building, split
//! finding and row partitioning, and uses the subtraction trick so only the
//! smaller child of every split is built from rows.

use std::time::{Duration, Instant};

use ndarray::{Array1, ArrayView1, ArrayView2};
use tracing::{debug, trace};

use crate::data::binned::{BinLayout, BinnedMatrix};
use crate::error::{Error, Result};
use crate::inference::gbdt::{Predictor, PredictorNode};

use super::expansion::{GrowthQueue, NodeCandidate};
use super::histograms::{
    GradientSums, Hessians, HistogramLayout, HistogramPool, NodeHistogram, is_contiguous_range,
};
use super::params::GrowerParams;
use super::partition::RowPartitioner;
use super::split::{GainParams, GreedySplitFinder, SplitFinder};
use super::tree::{NodeId, TreeNode};

/// Lifecycle of a [`TreeGrower`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowthState {
    /// Inputs validated; [`TreeGrower::grow`] not called yet.
    Ready,
    /// The tree is final.
    Grown,
}

/// Counters and timings of one [`TreeGrower::grow`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrowthStats {
    /// Histograms built by scanning rows.
    pub n_histograms_built: usize,
    /// Histograms derived as parent minus sibling.
    pub n_histograms_subtracted: usize,
    /// Pending histograms dropped from the cache; each costs one extra
    /// build from rows if its node is split later.
    pub n_histograms_evicted: usize,
    /// Splits applied.
    pub n_splits: usize,
    /// Time spent building histograms.
    pub histogram_time: Duration,
    /// Time spent searching splits.
    pub find_split_time: Duration,
    /// Time spent partitioning rows.
    pub apply_split_time: Duration,
    /// Wall time of the whole growth.
    pub total_time: Duration,
}

/// Tree grower for gradient boosting.
///
/// Grows a single regression tree from a binned matrix and per-sample
/// gradients and hessians. A hessian slice of length 1 is a constant hessian
/// shared by every sample.
///
/// ```
/// use histboost::data::{BinMapper, BinningParams};
/// use histboost::training::{GrowerParams, TreeGrower};
/// use ndarray::Array2;
///
/// let x = Array2::from_shape_fn((200, 2), |(i, j)| ((i * (j + 3)) % 17) as f64);
/// let y: Vec<f64> = x.column(0).iter().map(|&v| if v > 8.0 { 1.0 } else { -1.0 }).collect();
/// let gradients: Vec<f32> = y.iter().map(|&t| -t as f32).collect();
///
/// let (mapper, binned) = BinMapper::fit_transform(&BinningParams::default(), x.view()).unwrap();
/// let params = GrowerParams::builder().max_leaf_nodes(4).build().unwrap();
/// let mut grower =
///     TreeGrower::new(binned.view(), &mapper.layout(), &gradients, &[1.0], params).unwrap();
/// grower.grow().unwrap();
///
/// let predictor = grower.make_predictor(mapper.features()).unwrap();
/// let predictions = predictor.predict(x.view()).unwrap();
/// assert_eq!(predictions.len(), 200);
/// ```
pub struct TreeGrower<'a> {
    /// Binned features, borrowed when the layout allows it.
    binned: BinnedMatrix<'a>,
    /// Per-feature bin counts and the missing bin.
    layout: BinLayout,
    /// Histogram layout derived from `layout`.
    histogram_layout: HistogramLayout,
    /// Histograms of queued leaves, bounded by `max_cached_histograms`.
    histogram_pool: HistogramPool,
    gradients: &'a [f32],
    hessians: &'a [f32],
    params: GrowerParams,
    gain: GainParams,
    split_finder: GreedySplitFinder,
    /// Row partitioner.
    partitioner: RowPartitioner,
    /// Nodes in creation order; the root is node 0.
    nodes: Vec<TreeNode>,
    n_leaves: usize,
    state: GrowthState,
    stats: GrowthStats,
    /// Buffer for ordered (pre-gathered) gradients.
    /// Reused across histogram builds to avoid allocation.
    ordered_grad: Vec<f32>,
    /// Buffer for ordered (pre-gathered) hessians.
    ordered_hess: Vec<f32>,
}

impl<'a> TreeGrower<'a> {
    /// Create a grower and validate its inputs.
    ///
    /// # Arguments
    /// * `binned` - Binned features, `(n_samples, n_features)`
    /// * `layout` - Bin counts per feature and the missing bin
    /// * `gradients` - One gradient per sample
    /// * `hessians` - One hessian per sample, or a single constant hessian
    /// * `params` - Growth parameters
    ///
    /// # Errors
    ///
    /// Fails on invalid parameters, empty input, length mismatches between
    /// the arrays, and bins outside the declared layout.
    pub fn new(
        binned: ArrayView2<'a, u8>,
        layout: &BinLayout,
        gradients: &'a [f32],
        hessians: &'a [f32],
        params: GrowerParams,
    ) -> Result<Self> {
        params.validate()?;

        let (n_samples, n_features) = binned.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(Error::EmptyInput {
                n_samples,
                n_features,
            });
        }
        if n_samples > u32::MAX as usize {
            return Err(Error::TooManySamples {
                n_samples,
                max: u32::MAX as usize,
            });
        }
        if gradients.len() != n_samples {
            return Err(Error::LengthMismatch {
                what: "gradients",
                expected: n_samples,
                found: gradients.len(),
            });
        }
        if hessians.len() != 1 && hessians.len() != n_samples {
            return Err(Error::LengthMismatch {
                what: "hessians",
                expected: n_samples,
                found: hessians.len(),
            });
        }
        layout.validate(&binned)?;

        let binned = BinnedMatrix::new(binned);
        if binned.is_owned() {
            debug!(n_samples, n_features, "copied non-contiguous binned matrix");
        }

        Ok(Self {
            binned,
            layout: layout.clone(),
            histogram_layout: HistogramLayout::new(layout),
            histogram_pool: HistogramPool::new(params.max_cached_histograms),
            gradients,
            hessians,
            gain: params.gain_params(),
            params,
            split_finder: GreedySplitFinder::default(),
            partitioner: RowPartitioner::new(n_samples),
            nodes: Vec::new(),
            n_leaves: 0,
            state: GrowthState::Ready,
            stats: GrowthStats::default(),
            ordered_grad: Vec::with_capacity(n_samples),
            ordered_hess: Vec::new(),
        })
    }

    /// Grow the tree.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyGrown`] if called a second time.
    #[tracing::instrument(
        name = "grow_tree",
        skip_all,
        fields(n_samples = self.binned.n_samples(), n_features = self.binned.n_features())
    )]
    pub fn grow(&mut self) -> Result<()> {
        if self.state == GrowthState::Grown {
            return Err(Error::AlreadyGrown);
        }
        let start = Instant::now();

        let root_stats = self.root_stats();
        let root_range = self.partitioner.node_range(0);
        let root_value = self.leaf_value(&root_stats);
        self.nodes
            .push(TreeNode::leaf(0, 0, None, root_stats, root_value, root_range));
        self.n_leaves = 1;

        let mut queue = GrowthQueue::new();
        if self.is_splittable(&self.nodes[0]) {
            let histogram = self.build_histogram(0);
            self.evaluate_node(0, histogram, &mut queue);
        }

        // Main expansion loop
        while let Some(candidate) = queue.pop() {
            if self.leaf_budget_exhausted() {
                let dropped = queue.clear() + 1;
                trace!(dropped, "leaf budget exhausted");
                break;
            }
            self.split_node(candidate, &mut queue);
        }
        self.histogram_pool.clear();

        self.state = GrowthState::Grown;
        self.stats.n_histograms_evicted = self.histogram_pool.metrics().evictions;
        self.stats.total_time = start.elapsed();
        debug!(
            n_nodes = self.nodes.len(),
            n_leaves = self.n_leaves,
            max_depth = self.max_depth(),
            histograms_built = self.stats.n_histograms_built,
            histograms_subtracted = self.stats.n_histograms_subtracted,
            histograms_evicted = self.stats.n_histograms_evicted,
            elapsed_ms = self.stats.total_time.as_secs_f64() * 1e3,
            "grew tree"
        );
        Ok(())
    }

    fn leaf_budget_exhausted(&self) -> bool {
        self.params
            .max_leaf_nodes
            .is_some_and(|max| self.n_leaves >= max)
    }

    /// Node-level constraints that forbid any split.
    fn is_splittable(&self, node: &TreeNode) -> bool {
        node.n_samples() >= 2 * self.params.min_samples_leaf
            && node.stats.sum_hessians >= self.params.min_hessian_to_split
            && self.params.max_depth.is_none_or(|max| node.depth < max)
    }

    fn leaf_value(&self, stats: &GradientSums) -> f64 {
        self.gain
            .compute_leaf_value(stats.sum_gradients, stats.sum_hessians)
            * self.params.shrinkage
    }

    /// Gradient statistics over every sample.
    fn root_stats(&self) -> GradientSums {
        let n_samples = self.binned.n_samples();
        let sum_gradients = self.gradients.iter().map(|&g| g as f64).sum();
        let sum_hessians = match self.hessians {
            [constant] => *constant as f64 * n_samples as f64,
            hessians => hessians.iter().map(|&h| h as f64).sum(),
        };
        GradientSums {
            sum_gradients,
            sum_hessians,
            count: n_samples as u32,
        }
    }

    /// Build a node's histogram from its rows.
    fn build_histogram(&mut self, node: NodeId) -> NodeHistogram {
        let start = Instant::now();
        let indices = self.partitioner.node_indices(node);
        let views = self.binned.feature_views();
        let constant = match self.hessians {
            [constant] => Some(*constant),
            _ => None,
        };

        let histogram = if is_contiguous_range(indices) {
            // Rows are consecutive: read gradients in place.
            let begin = indices.first().map_or(0, |&r| r as usize);
            let rows = begin..begin + indices.len();
            let hessians = match constant {
                Some(h) => Hessians::Constant(h),
                None => Hessians::Ordered(&self.hessians[rows.clone()]),
            };
            NodeHistogram::build(
                &self.histogram_layout,
                &views,
                indices,
                &self.gradients[rows],
                hessians,
            )
        } else {
            self.ordered_grad.clear();
            self.ordered_grad
                .extend(indices.iter().map(|&r| self.gradients[r as usize]));
            let hessians = match constant {
                Some(h) => Hessians::Constant(h),
                None => {
                    self.ordered_hess.clear();
                    self.ordered_hess
                        .extend(indices.iter().map(|&r| self.hessians[r as usize]));
                    Hessians::Ordered(&self.ordered_hess)
                }
            };
            NodeHistogram::build(
                &self.histogram_layout,
                &views,
                indices,
                &self.ordered_grad,
                hessians,
            )
        };

        self.stats.n_histograms_built += 1;
        self.stats.histogram_time += start.elapsed();
        histogram
    }

    /// Search a node's best split and queue it if it improves the loss.
    fn evaluate_node(&mut self, node_id: NodeId, histogram: NodeHistogram, queue: &mut GrowthQueue) {
        let node = &self.nodes[node_id as usize];
        if !self.is_splittable(node) {
            return;
        }

        let start = Instant::now();
        let split = self.split_finder.find_best_split(
            &histogram,
            &self.histogram_layout,
            &node.stats,
            &self.gain,
        );
        self.stats.find_split_time += start.elapsed();

        match split {
            Some(split) if split.gain > 0.0 => {
                queue.push(NodeCandidate::new(node_id, split));
                if let Some(evicted) = self.histogram_pool.insert(node_id, histogram) {
                    trace!(node = evicted, "evicted pending histogram");
                }
            }
            _ => trace!(node = node_id, "no improving split"),
        }
    }

    /// Apply a candidate's split and evaluate both children.
    fn split_node(&mut self, candidate: NodeCandidate, queue: &mut GrowthQueue) {
        let NodeCandidate { node_id, split } = candidate;
        let parent_histogram = self.histogram_pool.take(node_id);

        // Partition rows
        let start = Instant::now();
        let view = self.binned.feature(split.feature);
        let missing_bin = self.layout.missing_bin();
        let (left_range, right_range) = self.partitioner.split(node_id, &split, &view, missing_bin);
        self.stats.apply_split_time += start.elapsed();
        debug_assert_eq!(left_range.len(), split.left.count as usize);
        debug_assert_eq!(right_range.len(), split.right.count as usize);

        let depth = self.nodes[node_id as usize].depth + 1;
        let left_id = self.nodes.len() as NodeId;
        let right_id = left_id + 1;
        let left_value = self.leaf_value(&split.left);
        let right_value = self.leaf_value(&split.right);
        self.nodes.push(TreeNode::leaf(
            left_id,
            depth,
            Some(node_id),
            split.left,
            left_value,
            left_range,
        ));
        self.nodes.push(TreeNode::leaf(
            right_id,
            depth,
            Some(node_id),
            split.right,
            right_value,
            right_range,
        ));
        debug_assert_eq!(self.partitioner.n_nodes(), self.nodes.len());

        trace!(
            node = node_id,
            feature = split.feature,
            bin = split.bin,
            missing_go_to_left = split.missing_go_to_left,
            gain = split.gain,
            left_count = split.left.count,
            right_count = split.right.count,
            "split node"
        );
        let left_smaller = split.left.count <= split.right.count;
        let parent = &mut self.nodes[node_id as usize];
        parent.left_child = Some(left_id);
        parent.right_child = Some(right_id);
        parent.split = Some(split);
        self.n_leaves += 1;
        self.stats.n_splits += 1;

        // The children can never be split once the budget is spent.
        if self.leaf_budget_exhausted() {
            return;
        }
        let left_splittable = self.is_splittable(&self.nodes[left_id as usize]);
        let right_splittable = self.is_splittable(&self.nodes[right_id as usize]);
        if !left_splittable && !right_splittable {
            return;
        }

        let (left_histogram, right_histogram) = match parent_histogram {
            // Subtraction trick: build the smaller child, derive the larger one.
            Some(mut large_histogram) => {
                let small_id = if left_smaller { left_id } else { right_id };
                let small_histogram = self.build_histogram(small_id);
                large_histogram.subtract(&small_histogram);
                self.stats.n_histograms_subtracted += 1;
                if left_smaller {
                    (small_histogram, large_histogram)
                } else {
                    (large_histogram, small_histogram)
                }
            }
            None => {
                trace!(node = node_id, "parent histogram evicted, building both children");
                (self.build_histogram(left_id), self.build_histogram(right_id))
            }
        };
        self.evaluate_node(left_id, left_histogram, queue);
        self.evaluate_node(right_id, right_histogram, queue);
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Lifecycle state.
    #[inline]
    pub fn state(&self) -> GrowthState {
        self.state
    }

    /// All nodes in creation order; empty before [`grow`](Self::grow).
    #[inline]
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Number of leaves.
    #[inline]
    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest node.
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Counters and timings of the last growth.
    #[inline]
    pub fn stats(&self) -> &GrowthStats {
        &self.stats
    }

    /// Growth parameters.
    #[inline]
    pub fn params(&self) -> &GrowerParams {
        &self.params
    }

    /// Bin layout of the training matrix.
    #[inline]
    pub fn layout(&self) -> &BinLayout {
        &self.layout
    }

    /// Training rows of a node. `None` for an unknown node.
    ///
    /// Leaf rows are ascending; an internal node lists its left child's rows
    /// before its right child's.
    pub fn sample_indices(&self, node: NodeId) -> Option<&[u32]> {
        self.nodes
            .get(node as usize)
            .map(|n| &self.partitioner.indices()[n.sample_range.clone()])
    }

    /// Leaf value of every training sample, from the final partition.
    ///
    /// # Errors
    ///
    /// [`Error::NotGrown`] before [`grow`](Self::grow).
    pub fn training_predictions(&self) -> Result<Array1<f64>> {
        self.ensure_grown()?;
        let mut predictions = Array1::zeros(self.binned.n_samples());
        for leaf in self.nodes.iter().filter(|n| n.is_leaf()) {
            for &row in &self.partitioner.indices()[leaf.sample_range.clone()] {
                predictions[row as usize] = leaf.value;
            }
        }
        Ok(predictions)
    }

    /// Evaluate the uncompiled tree on one binned row.
    ///
    /// # Errors
    ///
    /// [`Error::NotGrown`] before [`grow`](Self::grow),
    /// [`Error::FeatureCountMismatch`] for a row of the wrong width.
    pub fn predict_binned_row(&self, row: ArrayView1<'_, u8>) -> Result<f64> {
        self.ensure_grown()?;
        if row.len() != self.layout.n_features() {
            return Err(Error::FeatureCountMismatch {
                expected: self.layout.n_features(),
                found: row.len(),
            });
        }
        let missing_bin = self.layout.missing_bin();
        let mut node = &self.nodes[0];
        while let (Some(split), Some((left, right))) = (&node.split, node.children()) {
            let next = if split.goes_left(row[split.feature], missing_bin) {
                left
            } else {
                right
            };
            node = &self.nodes[next as usize];
        }
        Ok(node.value)
    }

    fn ensure_grown(&self) -> Result<()> {
        match self.state {
            GrowthState::Grown => Ok(()),
            GrowthState::Ready => Err(Error::NotGrown),
        }
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    /// Compile the grown tree into a [`Predictor`] working on raw values.
    ///
    /// `bin_thresholds[f]` are the thresholds feature `f` was binned with
    /// (for example [`BinMapper::features`](crate::data::BinMapper::features)).
    /// Nodes are emitted in pre-order.
    ///
    /// # Errors
    ///
    /// [`Error::NotGrown`] before [`grow`](Self::grow),
    /// [`Error::FeatureCountMismatch`] if the table has the wrong number of
    /// features, and [`Error::ThresholdMismatch`] if a split bin has no
    /// threshold.
    pub fn make_predictor<T: AsRef<[f64]>>(&self, bin_thresholds: &[T]) -> Result<Predictor> {
        self.ensure_grown()?;
        let n_features = self.layout.n_features();
        if bin_thresholds.len() != n_features {
            return Err(Error::FeatureCountMismatch {
                expected: n_features,
                found: bin_thresholds.len(),
            });
        }

        let mut compiled: Vec<PredictorNode> = Vec::with_capacity(self.nodes.len());
        // (node, parent slot and side)
        let mut stack: Vec<(NodeId, Option<(usize, bool)>)> = vec![(0, None)];
        while let Some((node_id, parent)) = stack.pop() {
            let index = compiled.len();
            if let Some((parent_index, is_left)) = parent {
                let parent_node = &mut compiled[parent_index];
                if is_left {
                    parent_node.left = index as u32;
                } else {
                    parent_node.right = index as u32;
                }
            }

            let node = &self.nodes[node_id as usize];
            let leaf = PredictorNode::leaf(node.value, node.stats.count, node.depth as u32);
            let compiled_node = match (&node.split, node.children()) {
                (Some(split), Some((left, right))) => {
                    let thresholds = bin_thresholds[split.feature].as_ref();
                    let bin = split.bin as usize;
                    let threshold = match thresholds.get(bin) {
                        Some(&t) => t,
                        // present-versus-missing split
                        None if bin == thresholds.len() => f64::INFINITY,
                        None => {
                            return Err(Error::ThresholdMismatch {
                                feature: split.feature,
                                bin: split.bin,
                                n_thresholds: thresholds.len(),
                            });
                        }
                    };
                    // left child is popped first: pre-order
                    stack.push((right, Some((index, false))));
                    stack.push((left, Some((index, true))));
                    PredictorNode::split(
                        split.feature as u32,
                        threshold,
                        split.bin,
                        split.missing_go_to_left,
                        split.gain,
                        leaf,
                    )
                }
                _ => leaf,
            };
            compiled.push(compiled_node);
        }

        Ok(Predictor::new(compiled, n_features))
    }
}
