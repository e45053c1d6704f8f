#![warn(missing_docs)]
//! Framework-agnostic building blocks for deep reinforcement learning.
//!
//! This crate provides the parts of an RL training system that do not depend
//! on a numerical framework: the experience-replay subsystem (uniform and
//! prioritized circular replay, n-step return pre-aggregation, on-policy
//! rollout storage) and the training-loop orchestration around it (sampling,
//! optimization gating, evaluation, checkpointing, metric recording).
//!
//! Anything that touches model parameters, gradients or losses is reached
//! through the [`Policy`] and [`Agent`] traits and lives in downstream
//! crates built on a concrete framework.
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, ExperienceBuffer, Info, NullReplayBuffer, Obs, Policy,
    ReplayBuffer, Step, StepProcessor, SubBatch, TransitionBatch,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Sampler, Trainer, TrainerConfig};

pub mod util;

pub mod test_util;
