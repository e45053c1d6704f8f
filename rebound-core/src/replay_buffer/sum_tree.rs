//! Sum tree for proportional prioritized sampling.
//!
//! The classic structure of Schaul et al.: a binary tree over the priority
//! values whose inner nodes hold subtree sums, allowing O(log n) updates and
//! prefix-sum retrieval. Companion min/max segment trees answer the queries
//! needed for weight normalization and for priming fresh transitions.
use segment_tree::{
    ops::{MaxIgnoreNaN, MinIgnoreNaN},
    SegmentPoint,
};
use serde::{Deserialize, Serialize};

/// How importance-sampling weights are normalized.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum WeightNormalizer {
    /// Normalize by the maximal weight over all stored transitions.
    All,
    /// Normalize by the maximal weight within the sampled batch.
    Batch,
}

/// Priority index of a prioritized replay buffer.
///
/// Priorities are stored exponentiated, `(p + eps)^alpha`, so sampling is
/// proportional to the usual PER probabilities. The raw (untransformed)
/// priorities feed a max tree; its leaves start at 1 so that the first
/// transitions enter at the reference priority.
pub struct SumTree {
    eps: f32,
    alpha: f32,
    capacity: usize,
    n_samples: usize,
    tree: Vec<f32>,
    min_tree: SegmentPoint<f32, MinIgnoreNaN>,
    max_tree: SegmentPoint<f32, MaxIgnoreNaN>,
    normalize: WeightNormalizer,
}

impl SumTree {
    /// Creates a sum tree with `capacity` leaves.
    pub fn new(capacity: usize, alpha: f32, normalize: WeightNormalizer) -> Self {
        assert!(capacity > 0);
        Self {
            eps: 1e-8,
            alpha,
            capacity,
            n_samples: 0,
            tree: vec![0f32; 2 * capacity - 1],
            min_tree: SegmentPoint::build(vec![f32::MAX; capacity], MinIgnoreNaN),
            max_tree: SegmentPoint::build(vec![1f32; capacity], MaxIgnoreNaN),
            normalize,
        }
    }

    fn propagate(&mut self, mut ix: usize, change: f32) {
        while ix != 0 {
            ix = (ix - 1) / 2;
            self.tree[ix] += change;
        }
    }

    fn retrieve(&self, mut s: f32) -> usize {
        let mut ix = 0;
        loop {
            let left = 2 * ix + 1;
            let right = left + 1;
            if left >= self.tree.len() {
                return ix;
            }
            // An empty right subtree means `s` overshot into unfilled
            // leaves; descend left instead.
            if s <= self.tree[left] || self.tree[right] == 0f32 {
                ix = left;
            } else {
                s -= self.tree[left];
                ix = right;
            }
        }
    }

    /// Sum of all stored priorities (after exponentiation).
    pub fn total(&self) -> f32 {
        self.tree[0]
    }

    /// Maximal raw priority over the leaves.
    pub fn max(&self) -> f32 {
        self.max_tree.query(0, self.max_tree.len())
    }

    /// Number of leaves holding a priority.
    pub fn len(&self) -> usize {
        self.n_samples
    }

    /// Returns `true` if no leaf holds a priority.
    pub fn is_empty(&self) -> bool {
        self.n_samples == 0
    }

    /// Sets the priority of a freshly inserted transition at `ix`.
    pub fn add(&mut self, ix: usize, p: f32) {
        debug_assert!(ix <= self.n_samples || self.n_samples == self.capacity);

        self.update(ix, p);

        if self.n_samples < self.capacity {
            self.n_samples += 1;
        }
    }

    /// Updates the raw priority at `ix`.
    ///
    /// The stored value is `(p + eps)^alpha`.
    pub fn update(&mut self, ix: usize, p: f32) {
        debug_assert!(ix < self.capacity);
        debug_assert!(p.is_finite());

        self.max_tree.modify(ix, p);
        let p = (p + self.eps).powf(self.alpha);
        self.min_tree.modify(ix, p);
        let ix = ix + self.capacity - 1;
        let change = p - self.tree[ix];
        self.tree[ix] = p;
        self.propagate(ix, change);
    }

    /// Returns the leaf whose priority interval covers the prefix sum `s`.
    pub fn get(&self, s: f32) -> usize {
        let ix = self.retrieve(s);
        debug_assert!(ix >= self.capacity - 1);
        (ix + 1 - self.capacity).min(self.n_samples.saturating_sub(1))
    }

    /// Samples `batch_size` leaf indices proportionally to their priorities
    /// and returns them with normalized importance-sampling weights.
    ///
    /// The weight of leaf `i` is `(N * P(i))^-beta` with `P(i)` its sampling
    /// probability and `N` the number of stored transitions, normalized
    /// according to the configured [`WeightNormalizer`].
    pub fn sample(&self, batch_size: usize, beta: f32) -> (Vec<usize>, Vec<f32>) {
        debug_assert!(self.n_samples > 0);

        let total = self.total();
        let ixs = (0..batch_size)
            .map(|_| self.get(total * fastrand::f32()))
            .collect::<Vec<_>>();

        let n = self.n_samples as f32 / total;
        let ws = ixs
            .iter()
            .map(|&ix| self.tree[ix + self.capacity - 1])
            .map(|p| (n * p).powf(-beta))
            .collect::<Vec<_>>();

        let w_max_inv = match self.normalize {
            WeightNormalizer::All => (n * self.min_tree.query(0, self.n_samples)).powf(beta),
            WeightNormalizer::Batch => 1f32 / ws.iter().fold(f32::MIN, |m, &w| w.max(m)),
        };
        let ws = ws.iter().map(|w| w * w_max_inv).collect::<Vec<_>>();

        debug_assert!(ws.iter().all(|w| w.is_finite()));

        (ixs, ws)
    }
}

#[cfg(test)]
mod tests {
    use super::{SumTree, WeightNormalizer};

    fn tree_with(data: &[f32]) -> SumTree {
        let mut sum_tree = SumTree::new(8, 1.0, WeightNormalizer::Batch);
        for (ix, &p) in data.iter().enumerate() {
            sum_tree.add(ix, p);
        }
        sum_tree
    }

    #[test]
    fn prefix_sum_retrieval() {
        let sum_tree = tree_with(&[0.5, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9]);

        assert_eq!(sum_tree.get(0.0), 0);
        assert_eq!(sum_tree.get(0.4), 0);
        assert_eq!(sum_tree.get(0.6), 1);
        assert_eq!(sum_tree.get(1.2), 2);
        assert_eq!(sum_tree.get(1.6), 3);
        assert_eq!(sum_tree.get(2.0), 4);
        assert_eq!(sum_tree.get(2.8), 4);
        // Past the total mass, the last stored leaf is returned.
        assert!(sum_tree.get(1e9) < 7);
    }

    #[test]
    fn update_moves_mass() {
        let mut sum_tree = tree_with(&[1.0, 1.0]);
        let total = sum_tree.total();
        sum_tree.update(1, 3.0);
        assert!(sum_tree.total() > total);
        assert_eq!(sum_tree.get(sum_tree.total() - 0.01), 1);
        assert_eq!(sum_tree.max(), 3.0);
    }

    #[test]
    fn sampling_is_proportional() {
        fastrand::seed(42);
        let data = vec![0.5f32, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9];
        let sum_tree = tree_with(&data);

        let n_samples = 100_000;
        let (ixs, ws) = sum_tree.sample(n_samples, 1.0);
        assert!(ixs.iter().all(|&ix| ix < data.len()));
        assert!(ws.iter().all(|&w| w > 0.0 && w <= 1.0 + 1e-6));

        let total = sum_tree.total();
        for ix in 0..data.len() {
            let expected = data[ix] / total * n_samples as f32;
            let actual = ixs.iter().filter(|&&e| e == ix).count() as f32;
            // 5% of the total sample count as slack.
            assert!((expected - actual).abs() < 0.05 * n_samples as f32);
        }
    }

    #[test]
    fn weights_normalized_over_all_samples() {
        fastrand::seed(42);
        let mut sum_tree = SumTree::new(8, 1.0, WeightNormalizer::All);
        for (ix, &p) in [0.1f32, 0.4, 0.7, 1.0].iter().enumerate() {
            sum_tree.add(ix, p);
        }

        let (ixs, ws) = sum_tree.sample(64, 0.5);
        // The rarest transition carries the maximal weight 1.
        for (ix, w) in ixs.iter().zip(ws.iter()) {
            assert!(*w <= 1.0 + 1e-6);
            if *ix == 0 {
                assert!((w - 1.0).abs() < 1e-5);
            }
        }
    }
}
