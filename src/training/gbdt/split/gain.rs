//! Gain computation and regularization parameters.

use crate::training::gbdt::histograms::GradientSums;

// =============================================================================
// Gain Parameters
// =============================================================================

/// Parameters for split gain computation and leaf value calculation.
///
/// Derived from [`GrowerParams`](crate::training::GrowerParams) once per tree
/// and read-only afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct GainParams {
    /// L2 regularization (lambda) added to every hessian sum.
    pub l2_regularization: f64,
    /// Minimum split gain (gamma) subtracted from every candidate gain.
    pub min_gain_to_split: f64,
    /// Each child needs a hessian sum strictly above this.
    pub min_hessian_to_split: f64,
    /// Minimum samples per child.
    pub min_samples_leaf: u32,
}

impl Default for GainParams {
    fn default() -> Self {
        Self {
            l2_regularization: 0.0,
            min_gain_to_split: 0.0,
            min_hessian_to_split: 1e-3,
            min_samples_leaf: 20,
        }
    }
}

impl GainParams {
    /// Structure score of a node: `G² / (H + λ)`.
    ///
    /// Returns zero when the regularized hessian vanishes, so empty sides never
    /// contribute an infinite score.
    #[inline]
    pub fn node_score(&self, sum_gradients: f64, sum_hessians: f64) -> f64 {
        let denominator = sum_hessians + self.l2_regularization;
        if denominator <= 0.0 {
            return 0.0;
        }
        sum_gradients * sum_gradients / denominator
    }

    /// Split gain of a left/right partition of a node.
    ///
    /// ```text
    /// gain = 0.5 * [G_L²/(H_L + λ) + G_R²/(H_R + λ) - G_P²/(H_P + λ)] - γ
    /// ```
    ///
    /// `parent_score` is [`node_score`](Self::node_score) of the node being
    /// split; callers compute it once per node.
    #[inline]
    pub fn compute_gain(&self, left: &GradientSums, right: &GradientSums, parent_score: f64) -> f64 {
        let score_left = self.node_score(left.sum_gradients, left.sum_hessians);
        let score_right = self.node_score(right.sum_gradients, right.sum_hessians);
        0.5 * (score_left + score_right - parent_score) - self.min_gain_to_split
    }

    /// Check if both children satisfy the per-leaf constraints.
    #[inline]
    pub fn is_valid_split(&self, left: &GradientSums, right: &GradientSums) -> bool {
        left.count >= self.min_samples_leaf
            && right.count >= self.min_samples_leaf
            && left.sum_hessians > self.min_hessian_to_split
            && right.sum_hessians > self.min_hessian_to_split
    }

    /// Newton step for a leaf: `-G / (H + λ)`, or zero for a vanishing denominator.
    #[inline]
    pub fn compute_leaf_value(&self, sum_gradients: f64, sum_hessians: f64) -> f64 {
        let denominator = sum_hessians + self.l2_regularization;
        if denominator <= 0.0 {
            return 0.0;
        }
        -sum_gradients / denominator
    }
}
