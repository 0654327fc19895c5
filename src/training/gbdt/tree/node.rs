//! Tree node used while growing.

use std::ops::Range;

use crate::training::gbdt::histograms::GradientSums;
use crate::training::gbdt::split::SplitInfo;

/// Type alias for tree node indices.
///
/// Ids follow creation order: the root is 0 and the children of a split get
/// the next two ids, left first.
pub type NodeId = u32;

/// A node of the tree being grown.
///
/// Every node starts as a leaf. Splitting it fills in `split` and the child
/// links; leaves keep `split == None` for good.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    /// Id of this node.
    pub id: NodeId,
    /// Distance from the root.
    pub depth: usize,
    /// Parent node, `None` for the root.
    pub parent: Option<NodeId>,
    /// Left child, once split.
    pub left_child: Option<NodeId>,
    /// Right child, once split.
    pub right_child: Option<NodeId>,
    /// Applied split (feature, bin threshold, missing direction, gain).
    pub split: Option<SplitInfo>,
    /// Gradient statistics of the node's samples.
    pub stats: GradientSums,
    /// Leaf prediction `-G / (H + λ)`, shrinkage applied.
    ///
    /// Also set on internal nodes, where it is the value the node would have
    /// predicted as a leaf.
    pub value: f64,
    /// Range of the node's samples in the grower's index buffer.
    pub sample_range: Range<usize>,
}

impl TreeNode {
    /// A fresh leaf.
    pub fn leaf(
        id: NodeId,
        depth: usize,
        parent: Option<NodeId>,
        stats: GradientSums,
        value: f64,
        sample_range: Range<usize>,
    ) -> Self {
        Self {
            id,
            depth,
            parent,
            left_child: None,
            right_child: None,
            split: None,
            stats,
            value,
            sample_range,
        }
    }

    /// Whether this node is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    /// Left and right child of a split node.
    #[inline]
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        self.left_child.zip(self.right_child)
    }

    /// Gain of the applied split.
    #[inline]
    pub fn gain(&self) -> Option<f64> {
        self.split.as_ref().map(|s| s.gain)
    }

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.stats.count as usize
    }
}
