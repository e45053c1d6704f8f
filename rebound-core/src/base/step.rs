//! Environment steps and their conversion into buffer items.
use super::Env;

/// Additional, algorithm-specific information attached to a [`Step`].
pub trait Info {}

impl Info for () {}

/// The outcome of a single environment step.
///
/// An environment emits one [`Step`] per interaction. Together with the
/// previous observation it forms a transition `(o_t, a_t, o_t+1, r_t)`.
/// The reward and flag vectors always have length 1.
pub struct Step<E: Env> {
    /// The action that was applied.
    pub act: E::Act,

    /// The observation after applying the action, `o_t+1`.
    pub obs: E::Obs,

    /// Reward `r_t`.
    pub reward: Vec<f32>,

    /// 1 if the episode reached a terminal state at this step.
    pub is_terminated: Vec<i8>,

    /// 1 if the episode was cut off at this step (e.g. a time limit).
    pub is_truncated: Vec<i8>,

    /// Extra information defined by the environment.
    pub info: E::Info,

    /// The initial observation of the next episode.
    ///
    /// Only present when the episode ended at this step and the environment
    /// has already been reset.
    pub init_obs: Option<E::Obs>,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        reward: Vec<f32>,
        is_terminated: Vec<i8>,
        is_truncated: Vec<i8>,
        info: E::Info,
        init_obs: Option<E::Obs>,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
            init_obs,
        }
    }

    /// Terminated or truncated.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.is_terminated[0] == 1 || self.is_truncated[0] == 1
    }
}

/// Converts [`Step`] objects into items a buffer accepts.
///
/// The [`Trainer`](crate::Trainer) feeds every step through a processor and
/// pushes the produced item into a buffer implementing
/// [`ExperienceBuffer`](crate::ExperienceBuffer); `Self::Output` must match
/// the buffer's item type. Processors are where transitions are shaped, for
/// example by folding n-step returns before storage.
pub trait StepProcessor<E: Env> {
    /// Configuration of the processor.
    type Config: Clone;

    /// The type of items produced from steps.
    type Output;

    /// Builds a processor.
    fn build(config: &Self::Config) -> Self;

    /// Resets the processor with the initial observation of an episode.
    fn reset(&mut self, init_obs: E::Obs);

    /// Processes a step.
    fn process(&mut self, step: Step<E>) -> Self::Output;
}
