//! Row partitioning for tree training.
//!
//! Manages row indices per node, enabling efficient partitioning when applying
//! splits. A single contiguous buffer holds every row index; each node owns a
//! range of it, and splitting a node partitions its range in place.
//!
//! Partitioning is stable: both children keep the relative row order of their
//! parent. Since the root starts in ascending order, every node's rows stay
//! sorted, which keeps bin lookups and gradient gathers cache friendly.

use std::ops::Range;

use super::split::SplitInfo;
use super::tree::NodeId;
use crate::data::binned::FeatureView;

/// Manages row indices per node during tree training.
///
/// ```text
/// Initial (all rows in node 0):
///   indices: [0, 1, 2, 3, 4, 5, 6, 7]
///   node 0: 0..8
///
/// After splitting node 0 (even rows left into node 1, odd rows right into node 2):
///   indices: [0, 2, 4, 6, 1, 3, 5, 7]
///   node 0: 0..8, node 1: 0..4, node 2: 4..8
/// ```
#[derive(Clone, Debug)]
pub struct RowPartitioner {
    /// Row indices buffer. Partitioned in place.
    indices: Box<[u32]>,
    /// Start position of each node's range in `indices`.
    node_begin: Vec<u32>,
    /// Number of rows of each node.
    node_count: Vec<u32>,
    /// Right-going rows of the split being applied.
    scratch: Vec<u32>,
}

impl RowPartitioner {
    /// Create a partitioner with all `n_samples` rows in the root (node 0).
    pub fn new(n_samples: usize) -> Self {
        Self {
            indices: (0..n_samples as u32).collect(),
            node_begin: vec![0],
            node_count: vec![n_samples as u32],
            scratch: Vec::new(),
        }
    }

    /// Row indices of a node.
    #[inline]
    pub fn node_indices(&self, node: NodeId) -> &[u32] {
        &self.indices[self.node_range(node)]
    }

    /// Range of a node in the shared index buffer.
    #[inline]
    pub fn node_range(&self, node: NodeId) -> Range<usize> {
        let begin = self.node_begin[node as usize] as usize;
        begin..begin + self.node_count[node as usize] as usize
    }

    /// Number of rows of a node.
    #[cfg(test)]
    fn node_count(&self, node: NodeId) -> u32 {
        self.node_count[node as usize]
    }

    /// Number of nodes with an assigned range.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.node_begin.len()
    }

    /// Whole index buffer.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Split a node according to a split decision.
    ///
    /// The two children get the next two node ids, left first, and must be
    /// the next nodes the caller allocates.
    ///
    /// # Returns
    /// `(left_range, right_range)` in the shared index buffer.
    pub fn split(
        &mut self,
        node: NodeId,
        split: &SplitInfo,
        view: &FeatureView<'_>,
        missing_bin: u8,
    ) -> (Range<usize>, Range<usize>) {
        let range = self.node_range(node);
        let begin = range.start;

        // Left rows are compacted in place; right rows wait in scratch.
        self.scratch.clear();
        let mut left_end = begin;
        for i in range.clone() {
            let row = self.indices[i];
            if split.goes_left(view.bin(row as usize), missing_bin) {
                self.indices[left_end] = row;
                left_end += 1;
            } else {
                self.scratch.push(row);
            }
        }
        self.indices[left_end..range.end].copy_from_slice(&self.scratch);

        let left = begin..left_end;
        let right = left_end..range.end;
        for child in [&left, &right] {
            self.node_begin.push(child.start as u32);
            self.node_count.push(child.len() as u32);
        }
        (left, right)
    }
}
