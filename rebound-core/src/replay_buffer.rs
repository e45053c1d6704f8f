//! The experience-replay subsystem.
//!
//! Three stores cover the usual training regimes:
//!
//! * [`TransitionBuffer`] — a fixed-capacity circular store for off-policy
//!   learning, sampling either uniformly or by priority
//!   (prioritized experience replay with importance-sampling weights).
//! * [`RolloutBuffer`] — a fixed-length trajectory store for on-policy
//!   learning, drained in insertion order once full.
//!
//! Transitions enter the stores through step processors:
//! [`OneStepProcessor`] emits plain 1-step transitions, while
//! [`NStepProcessor`] folds the rewards of `n` consecutive steps into a
//! single transition before storage (n-step return pre-aggregation).
mod base;
mod batch;
mod beta_schedule;
mod config;
mod rollout;
mod step_proc;
mod sum_tree;

pub use base::TransitionBuffer;
pub use batch::Minibatch;
pub use beta_schedule::BetaSchedule;
pub use config::{PerConfig, TransitionBufferConfig};
pub use rollout::{RolloutBuffer, RolloutBufferConfig};
pub use step_proc::{NStepProcessor, NStepProcessorConfig, OneStepProcessor, OneStepProcessorConfig};
pub use sum_tree::{SumTree, WeightNormalizer};
