//! Generic transition batches.
use crate::{SubBatch, TransitionBatch};

/// A batch of transitions over arbitrary observation and action columns.
///
/// `Minibatch` serves two roles: it is the item type pushed into the
/// buffers (a step processor may emit zero, one or several transitions at
/// once) and the batch type sampled out of them. The PER fields
/// `ix_sample` and `weight` are populated only on the way out of a
/// prioritized buffer.
pub struct Minibatch<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    /// Observations `o_t`.
    pub obs: O,

    /// Actions `a_t`.
    pub act: A,

    /// Observations `o_t+n` (n = 1 unless n-step aggregation is used).
    pub next_obs: O,

    /// Rewards. For n-step transitions this is the folded return
    /// `sum_k gamma^k r_t+k`.
    pub reward: Vec<f32>,

    /// Termination flags.
    pub is_terminated: Vec<i8>,

    /// Truncation flags.
    pub is_truncated: Vec<i8>,

    /// Buffer indices the transitions were sampled from.
    pub ix_sample: Option<Vec<usize>>,

    /// Importance-sampling weights.
    pub weight: Option<Vec<f32>>,
}

impl<O, A> Minibatch<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    /// Creates an empty batch with column storage for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: Vec::with_capacity(capacity),
            is_terminated: Vec::with_capacity(capacity),
            is_truncated: Vec::with_capacity(capacity),
            ix_sample: None,
            weight: None,
        }
    }

}

impl<O, A> TransitionBatch for Minibatch<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    type ObsBatch = O;
    type ActBatch = A;

    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
        Vec<i8>,
        Option<Vec<usize>>,
        Option<Vec<f32>>,
    ) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminated,
            self.is_truncated,
            self.ix_sample,
            self.weight,
        )
    }

    /// The batch length is the length of the reward column.
    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &Self::ObsBatch {
        &self.obs
    }

    fn act(&self) -> &Self::ActBatch {
        &self.act
    }
}
