//! Sampling of experiences from an environment.
use crate::{record::Record, Env, ExperienceBuffer, Policy, StepProcessor};
use anyhow::Result;
use std::time::SystemTime;

/// Steps an environment with a policy and feeds the produced transitions
/// into a buffer.
///
/// The sampler owns the environment and the step processor, keeps the
/// running observation between calls, and handles episode boundaries: on
/// the first call the environment is reset lazily, and whenever an episode
/// ends the processor is re-seeded with the next episode's initial
/// observation. Environment frames per second are tracked for the
/// trainer's cost records.
pub struct Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    env: E,
    prev_obs: Option<E::Obs>,
    step_processor: P,

    /// Frames sampled since the FPS counter was reset.
    n_frames: usize,
    time: SystemTime,
}

impl<E, P> Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    /// Creates a sampler.
    pub fn new(env: E, step_processor: P) -> Self {
        Self {
            env,
            prev_obs: None,
            step_processor,
            n_frames: 0,
            time: SystemTime::now(),
        }
    }

    /// Performs one environment step and pushes the processed transition
    /// into `buffer`.
    ///
    /// Returns the record emitted by the environment for this step.
    pub fn sample_and_push<Po, R>(&mut self, policy: &mut Po, buffer: &mut R) -> Result<Record>
    where
        Po: Policy<E>,
        R: ExperienceBuffer<Item = P::Output>,
    {
        // Lazy reset on the first call.
        if self.prev_obs.is_none() {
            let obs = self.env.reset()?;
            self.step_processor.reset(obs.clone());
            self.prev_obs = Some(obs);
        }

        let act = policy.sample(self.prev_obs.as_ref().expect("running observation"));
        let (step, record) = self.env.step_with_reset(&act);
        let is_done = step.is_done();

        self.prev_obs = match is_done {
            true => Some(
                step.init_obs
                    .clone()
                    .expect("init_obs after an episode end"),
            ),
            false => Some(step.obs.clone()),
        };

        let item = self.step_processor.process(step);
        buffer.push(item)?;

        if is_done {
            self.step_processor
                .reset(self.prev_obs.as_ref().expect("running observation").clone());
        }

        self.n_frames += 1;

        Ok(record)
    }

    /// Environment frames per second since the last counter reset.
    pub fn fps(&self) -> f32 {
        match self.time.elapsed() {
            Ok(elapsed) if elapsed.as_millis() > 0 => {
                1000. * self.n_frames as f32 / elapsed.as_millis() as f32
            }
            _ => 0.,
        }
    }

    /// Resets the FPS counter.
    pub fn reset_fps_counter(&mut self) {
        self.n_frames = 0;
        self.time = SystemTime::now();
    }
}
