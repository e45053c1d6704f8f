//! Batches of transitions.

/// A batch of transitions sampled from a replay buffer.
///
/// Agents unpack a batch into its columns for an optimization step. The
/// sample indices and importance-sampling weights are present only for
/// batches drawn from a prioritized buffer.
pub trait TransitionBatch {
    /// Observations in the batch.
    type ObsBatch;

    /// Actions in the batch.
    type ActBatch;

    /// Unpacks the batch into
    /// `(obs, act, next_obs, reward, is_terminated, is_truncated, ix_sample, weight)`.
    #[allow(clippy::type_complexity)]
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
    );

    /// Returns the number of transitions in the batch.
    fn len(&self) -> usize;

    /// Returns `true` if the batch contains no transitions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the observations.
    fn obs(&self) -> &Self::ObsBatch;

    /// Returns the actions.
    fn act(&self) -> &Self::ActBatch;
}
