//! Evaluation of policies.
use crate::{Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluates a policy.
///
/// The caller handles the mode of the policy (the trainer switches an agent
/// to evaluation mode around the call and back afterwards).
pub trait Evaluator<E: Env, P: Policy<E>> {
    /// Runs evaluation episodes and returns the mean episode return.
    fn evaluate(&mut self, policy: &mut P) -> Result<f32>;
}
