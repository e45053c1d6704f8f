//! Buffer interfaces.
//!
//! Buffers have two sides: a push side ([`ExperienceBuffer`]) used while
//! interacting with the environment, and a sample side ([`ReplayBuffer`])
//! used during optimization. The two are separate traits so that processes
//! which only collect experiences need not know how batches are formed.
use anyhow::Result;

/// The push side of a buffer storing experiences.
pub trait ExperienceBuffer {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes an item into the buffer.
    fn push(&mut self, item: Self::Item) -> Result<()>;

    /// Returns the number of stored transitions.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no transitions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The sample side of a buffer: batch generation for optimization steps.
pub trait ReplayBuffer {
    /// Configuration of the buffer.
    type Config: Clone;

    /// The type of batches generated for training.
    type Batch;

    /// Builds a buffer.
    fn build(config: &Self::Config) -> Self;

    /// Samples a batch of transitions.
    ///
    /// Returns an error if the buffer is empty or holds fewer transitions
    /// than requested.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;

    /// Updates the priorities of previously sampled transitions.
    ///
    /// Prioritized buffers interpret `td_errs` as absolute TD errors of the
    /// transitions at `ixs`, as returned in the batch's sample indices.
    /// Buffers without priorities ignore the call.
    fn update_priority(&mut self, ixs: &Option<Vec<usize>>, td_errs: &Option<Vec<f32>>);
}

/// A replay buffer that does nothing.
///
/// A placeholder for agents that do not learn from replay.
pub struct NullReplayBuffer;

impl ReplayBuffer for NullReplayBuffer {
    type Batch = ();
    type Config = ();

    fn build(_config: &Self::Config) -> Self {
        Self
    }

    fn batch(&mut self, _size: usize) -> Result<Self::Batch> {
        unimplemented!();
    }

    fn update_priority(&mut self, _ixs: &Option<Vec<usize>>, _td_errs: &Option<Vec<f32>>) {}
}

/// Storage for one column of a transition (observations or actions).
///
/// A `SubBatch` is used both as the backing store of a buffer column, with
/// `capacity` entries and circular writes, and as the column of a sampled
/// batch. Implementations define the per-entry layout; the library only
/// moves entries around by index.
pub trait SubBatch {
    /// Creates storage for `capacity` entries.
    fn new(capacity: usize) -> Self;

    /// Copies all entries of `data` into `self`, starting at index `ix` and
    /// wrapping around at the capacity of `self`.
    fn push(&mut self, ix: usize, data: &Self);

    /// Returns a new object holding the entries at `ixs`.
    fn sample(&self, ixs: &[usize]) -> Self;
}
