//! Leaf-wise expansion queue.
//!
//! Leaves with an applicable split wait in a max-heap keyed by split gain.
//! The grower always expands the best leaf next, so the tree grows where the
//! loss drops most rather than level by level.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::split::SplitInfo;
use super::tree::NodeId;

// ============================================================================
// NodeCandidate
// ============================================================================

/// A leaf waiting to be split.
///
/// The node's histogram, needed to derive the larger child by subtraction,
/// lives in the grower's [`HistogramPool`](super::histograms::HistogramPool).
#[derive(Debug, Clone)]
pub struct NodeCandidate {
    /// Node to split.
    pub node_id: NodeId,
    /// Best split found for this node.
    pub split: SplitInfo,
}

impl NodeCandidate {
    /// Create a new candidate.
    pub fn new(node_id: NodeId, split: SplitInfo) -> Self {
        Self { node_id, split }
    }

    /// Get the gain of the best split.
    #[inline]
    pub fn gain(&self) -> f64 {
        self.split.gain
    }

    fn priority(&self) -> (f64, Reverse<NodeId>) {
        (self.gain(), Reverse(self.node_id))
    }
}

// Higher gain first; among equal gains the earlier node.
impl Ord for NodeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        let (gain, node) = self.priority();
        let (other_gain, other_node) = other.priority();
        gain.total_cmp(&other_gain).then(node.cmp(&other_node))
    }
}

impl PartialOrd for NodeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NodeCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NodeCandidate {}

// ============================================================================
// GrowthQueue
// ============================================================================

/// Max-priority queue of split candidates.
#[derive(Debug, Default)]
pub struct GrowthQueue {
    heap: BinaryHeap<NodeCandidate>,
}

impl GrowthQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate.
    pub fn push(&mut self, candidate: NodeCandidate) {
        self.heap.push(candidate);
    }

    /// Remove the candidate with the highest gain.
    pub fn pop(&mut self) -> Option<NodeCandidate> {
        self.heap.pop()
    }

    /// Number of waiting candidates.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every candidate, returning how many were waiting.
    pub fn clear(&mut self) -> usize {
        let n = self.heap.len();
        self.heap.clear();
        n
    }
}
