//! Training loop orchestration.
mod config;
mod sampler;
use std::{
    path::Path,
    time::{Duration, SystemTime},
};

use crate::{
    record::{Record, RecordValue::Scalar, Recorder},
    Agent, Env, Evaluator, ExperienceBuffer, ReplayBuffer, StepProcessor,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::info;
pub use sampler::Sampler;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Drives the interaction of agent, environment and replay buffer.
///
/// One *environment step* is an action applied to the environment; one
/// *optimization step* is one call of [`Agent::opt`]. The trainer counts
/// both and gates everything else on them:
///
/// 1. Sample an action, apply it, and push the processed transition into
///    the buffer.
/// 2. Before `warmup_period` environment steps, or between multiples of
///    `opt_interval`, go back to 1.
/// 3. Otherwise ask the agent to optimize. The agent may still decline
///    (e.g. its own warmup), in which case `opt_steps` does not advance.
/// 4. Every `eval_interval` optimization steps, evaluate the agent and
///    keep the best model checkpoint; every `save_interval` steps, write a
///    periodic checkpoint; every `flush_record_interval` steps, flush
///    aggregated records.
/// 5. Stop after `max_opts` optimization steps.
///
/// For off-policy agents `opt_interval` is the usual update interval (e.g.
/// every 4 steps). For on-policy agents it is set to the rollout length, so
/// the rollout buffer is full exactly when the agent drains it.
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|"Step&lt;E&gt;"|C[StepProcessor]
///     C -->|Minibatch|D[ReplayBuffer]
///     D -->|batch|A
/// ```
pub struct Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBuffer<Item = P::Output> + ReplayBuffer,
{
    env_config: E::Config,
    step_proc_config: P::Config,
    replay_buffer_config: R::Config,

    model_dir: Option<String>,
    max_opts: usize,
    opt_interval: usize,
    warmup_period: usize,
    eval_interval: usize,
    save_interval: usize,
    record_agent_info_interval: usize,
    record_compute_cost_interval: usize,
    flush_record_interval: usize,

    /// Optimization steps since the OSPS counter was reset.
    opt_steps_for_osps: usize,

    /// Accumulated optimization time since the OSPS counter was reset.
    timer_for_osps: Duration,
}

impl<E, P, R> Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBuffer<Item = P::Output> + ReplayBuffer,
{
    /// Constructs a trainer.
    pub fn build(
        config: TrainerConfig,
        env_config: E::Config,
        step_proc_config: P::Config,
        replay_buffer_config: R::Config,
    ) -> Self {
        Self {
            env_config,
            step_proc_config,
            replay_buffer_config,
            model_dir: config.model_dir,
            max_opts: config.max_opts,
            opt_interval: config.opt_interval,
            warmup_period: config.warmup_period,
            eval_interval: config.eval_interval,
            save_interval: config.save_interval,
            record_agent_info_interval: config.record_agent_info_interval,
            record_compute_cost_interval: config.record_compute_cost_interval,
            flush_record_interval: config.flush_record_interval,
            opt_steps_for_osps: 0,
            timer_for_osps: Duration::new(0, 0),
        }
    }

    fn save_model<A: Agent<E, R>>(agent: &A, model_dir: String) {
        match agent.save_params(Path::new(&model_dir)) {
            Ok(()) => info!("saved the model in {:?}", &model_dir),
            Err(_) => info!("failed to save the model in {:?}", &model_dir),
        }
    }

    /// Optimization steps per second since the last reset of the counter.
    fn opt_steps_per_sec(&mut self) -> f32 {
        let millis = self.timer_for_osps.as_millis() as f32;
        let osps = if millis > 0. {
            1000. * self.opt_steps_for_osps as f32 / millis
        } else {
            0.
        };
        self.opt_steps_for_osps = 0;
        self.timer_for_osps = Duration::new(0, 0);
        osps
    }

    /// Performs one environment step and, if due, one optimization step.
    ///
    /// The second element of the returned tuple is `true` if an
    /// optimization step was performed.
    pub fn train_step<A>(
        &mut self,
        agent: &mut A,
        buffer: &mut R,
        sampler: &mut Sampler<E, P>,
        env_steps: &mut usize,
        opt_steps: &mut usize,
    ) -> Result<(Record, bool)>
    where
        A: Agent<E, R>,
    {
        let record = sampler.sample_and_push(agent, buffer)?;
        *env_steps += 1;

        if *env_steps < self.warmup_period || *env_steps % self.opt_interval != 0 {
            return Ok((record, false));
        }

        let timer = SystemTime::now();
        match agent.opt(buffer) {
            None => Ok((record, false)),
            Some(agent_record) => {
                *opt_steps += 1;
                self.timer_for_osps += timer.elapsed()?;
                self.opt_steps_for_osps += 1;
                let record = if *opt_steps % self.record_agent_info_interval == 0 {
                    record.merge(agent_record)
                } else {
                    record
                };
                Ok((record, true))
            }
        }
    }

    /// Trains the agent for `max_opts` optimization steps.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn Recorder,
        evaluator: &mut D,
    ) -> Result<()>
    where
        A: Agent<E, R>,
        D: Evaluator<E, A>,
    {
        let env = E::build(&self.env_config, 0)?;
        let step_processor = P::build(&self.step_proc_config);
        let mut buffer = R::build(&self.replay_buffer_config);
        let mut sampler = Sampler::new(env, step_processor);
        let mut max_eval_reward = f32::MIN;
        let mut env_steps: usize = 0;
        let mut opt_steps: usize = 0;
        sampler.reset_fps_counter();
        agent.train();

        loop {
            let (mut record, is_opt) =
                self.train_step(agent, &mut buffer, &mut sampler, &mut env_steps, &mut opt_steps)?;

            if is_opt {
                if opt_steps % self.record_compute_cost_interval == 0 {
                    record.insert("fps", Scalar(sampler.fps()));
                    record.insert("opt_steps_per_sec", Scalar(self.opt_steps_per_sec()));
                    sampler.reset_fps_counter();
                }

                if opt_steps % self.eval_interval == 0 {
                    info!("evaluating the agent after {} optimization steps", opt_steps);
                    agent.eval();
                    let eval_reward = evaluator.evaluate(agent)?;
                    agent.train();
                    record.insert("eval_reward", Scalar(eval_reward));

                    if eval_reward > max_eval_reward {
                        max_eval_reward = eval_reward;
                        if let Some(model_dir) = &self.model_dir {
                            Self::save_model(agent, format!("{}/best", model_dir));
                        }
                    }
                }

                if opt_steps % self.save_interval == 0 {
                    if let Some(model_dir) = &self.model_dir {
                        Self::save_model(agent, format!("{}/{}", model_dir, opt_steps));
                    }
                }
            }

            if !record.is_empty() {
                recorder.store(record);
            }

            if is_opt && opt_steps % self.flush_record_interval == 0 {
                recorder.flush(opt_steps as _);
            }

            if is_opt && opt_steps == self.max_opts {
                break;
            }
        }

        info!(
            "training finished after {} environment steps and {} optimization steps",
            env_steps, opt_steps
        );

        Ok(())
    }
}
