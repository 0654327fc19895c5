//! Bounded histogram cache with LRU eviction.
//!
//! Every leaf waiting in the growth queue needs its histogram once it is
//! split, to derive the larger child by subtraction. The pool keeps at most
//! `capacity` of them; when full, the least recently stored histogram is
//! dropped and the grower rebuilds both children of that node from rows.

use std::collections::{HashMap, VecDeque};

use super::NodeHistogram;
use crate::training::gbdt::tree::NodeId;

/// Pool counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Requested histograms that were still cached.
    pub hits: usize,
    /// Requested histograms that had been evicted.
    pub misses: usize,
    /// Histograms dropped to make room.
    pub evictions: usize,
    /// Maximum number of histograms held at once.
    pub peak_usage: usize,
}

/// Histograms of pending nodes, keyed by node id.
#[derive(Debug)]
pub struct HistogramPool {
    capacity: usize,
    histograms: HashMap<NodeId, NodeHistogram>,
    /// Front is least recently stored.
    lru_order: VecDeque<NodeId>,
    metrics: PoolMetrics,
}

impl HistogramPool {
    /// Empty pool holding at most `capacity` histograms (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            histograms: HashMap::with_capacity(capacity),
            lru_order: VecDeque::with_capacity(capacity),
            metrics: PoolMetrics::default(),
        }
    }

    /// Store a node's histogram, evicting the least recently stored one when
    /// full. Returns the evicted node.
    pub fn insert(&mut self, node: NodeId, histogram: NodeHistogram) -> Option<NodeId> {
        if self.histograms.insert(node, histogram).is_some() {
            self.remove_from_lru(node);
            self.lru_order.push_back(node);
            return None;
        }

        let evicted = if self.histograms.len() > self.capacity {
            let victim = self.lru_order.pop_front();
            if let Some(victim) = victim {
                self.histograms.remove(&victim);
                self.metrics.evictions += 1;
            }
            victim
        } else {
            None
        };
        self.lru_order.push_back(node);
        self.metrics.peak_usage = self.metrics.peak_usage.max(self.histograms.len());
        evicted
    }

    /// Remove and return a node's histogram, `None` if it was evicted.
    pub fn take(&mut self, node: NodeId) -> Option<NodeHistogram> {
        match self.histograms.remove(&node) {
            Some(histogram) => {
                self.remove_from_lru(node);
                self.metrics.hits += 1;
                Some(histogram)
            }
            None => {
                self.metrics.misses += 1;
                None
            }
        }
    }

    /// Whether a node's histogram is cached.
    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.histograms.contains_key(&node)
    }

    /// Number of cached histograms.
    #[inline]
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// Whether no histogram is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Maximum number of cached histograms.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Counters since creation.
    #[inline]
    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    /// Drop every cached histogram.
    pub fn clear(&mut self) {
        self.histograms.clear();
        self.lru_order.clear();
    }

    fn remove_from_lru(&mut self, node: NodeId) {
        if let Some(pos) = self.lru_order.iter().position(|&n| n == node) {
            self.lru_order.remove(pos);
        }
    }
}
