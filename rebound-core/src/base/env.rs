//! Environment interface.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// An environment, typically a Markov decision process.
pub trait Env {
    /// Configuration of the environment.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information attached to [`Step`] objects.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Applies an action and returns the resulting step.
    ///
    /// The environment may attach metrics of the step to the returned
    /// [`Record`].
    fn step(&mut self, act: &Self::Act) -> (Step<Self>, Record)
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Applies an action and resets the environment if the episode ended.
    ///
    /// When the episode ended, the initial observation of the next episode
    /// is stored in [`Step::init_obs`].
    fn step_with_reset(&mut self, act: &Self::Act) -> (Step<Self>, Record)
    where
        Self: Sized;

    /// Resets the environment with an index.
    ///
    /// The index is used in an environment-defined way, typically as a
    /// random seed. [`DefaultEvaluator`](crate::DefaultEvaluator) calls this
    /// to make evaluation episodes reproducible.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;
}
