//! Trainable policies.
use super::{Env, Policy, ReplayBuffer};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// A trainable policy on an environment.
///
/// An agent owns its model parameters, optimizer state and, where
/// applicable, a target network. All of those are framework-specific and
/// opaque to this crate; the [`Trainer`](crate::Trainer) only drives the
/// agent through this interface.
pub trait Agent<E: Env, R: ReplayBuffer>: Policy<E> {
    /// Switches the agent to training mode.
    fn train(&mut self);

    /// Switches the agent to evaluation mode.
    fn eval(&mut self);

    /// Returns `true` while the agent is in training mode.
    fn is_train(&self) -> bool;

    /// Performs an optimization step with batches sampled from `buffer`.
    ///
    /// Returns `None` when the agent skips the step, for example while the
    /// buffer has not yet reached the agent's own warmup size. Prioritized
    /// buffers are refreshed from within this method via
    /// [`ReplayBuffer::update_priority`] once TD errors are known.
    fn opt(&mut self, buffer: &mut R) -> Option<Record>;

    /// Saves the parameters of the agent into the given directory.
    ///
    /// This usually creates several files in the directory, e.g. one per
    /// model, including target networks.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Loads the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
