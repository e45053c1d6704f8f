//! Step processors: turning environment steps into stored transitions.
use super::Minibatch;
use crate::{Env, Obs, Step, StepProcessor, SubBatch};
use std::{collections::VecDeque, marker::PhantomData};

/// Configuration of [`OneStepProcessor`].
#[derive(Clone, Debug, Default)]
pub struct OneStepProcessorConfig {}

/// Produces plain 1-step transitions `(o_t, a_t, o_t+1, r_t)`.
///
/// The processor keeps the previous observation between calls; after an
/// episode ends it re-seeds itself from the initial observation of the next
/// episode carried in the step.
pub struct OneStepProcessor<E, O, A> {
    prev_obs: Option<O>,
    phantom: PhantomData<(E, A)>,
}

impl<E, O, A> StepProcessor<E> for OneStepProcessor<E, O, A>
where
    E: Env,
    O: SubBatch + From<E::Obs>,
    A: SubBatch + From<E::Act>,
{
    type Config = OneStepProcessorConfig;
    type Output = Minibatch<O, A>;

    fn build(_config: &Self::Config) -> Self {
        Self {
            prev_obs: None,
            phantom: PhantomData,
        }
    }

    fn reset(&mut self, init_obs: E::Obs) {
        self.prev_obs = Some(init_obs.into());
    }

    /// Emits the transition ending in `step`.
    ///
    /// # Panics
    ///
    /// Panics if [`StepProcessor::reset`] was not called first.
    fn process(&mut self, step: Step<E>) -> Self::Output {
        assert_eq!(step.obs.len(), 1);

        let is_done = step.is_done();
        let next_obs = O::from(step.obs.clone());
        let obs = self
            .prev_obs
            .replace(step.obs.into())
            .expect("OneStepProcessor::process() called before reset()");

        if is_done {
            self.prev_obs = step.init_obs.map(O::from);
        }

        Minibatch {
            obs,
            act: step.act.into(),
            next_obs,
            reward: step.reward,
            is_terminated: step.is_terminated,
            is_truncated: step.is_truncated,
            ix_sample: None,
            weight: None,
        }
    }
}

/// Configuration of [`NStepProcessor`].
#[derive(Clone, Debug)]
pub struct NStepProcessorConfig {
    /// Number of steps folded into one transition.
    pub n_step: usize,

    /// Discount factor applied per step.
    pub gamma: f64,
}

impl Default for NStepProcessorConfig {
    fn default() -> Self {
        Self {
            n_step: 1,
            gamma: 0.99,
        }
    }
}

impl NStepProcessorConfig {
    /// Sets the number of folded steps.
    pub fn n_step(mut self, n_step: usize) -> Self {
        self.n_step = n_step;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }
}

/// Pre-aggregates n-step returns before storage.
///
/// The processor queues the last `n` `(o, a)` pairs and their rewards. Once
/// the queue is full, each new step releases the oldest pair as a transition
/// with reward `sum_k gamma^k r_t+k` and the current observation as
/// `o_t+n`. While the queue is filling the emitted batch is empty, and when
/// an episode ends the queue is flushed with progressively shorter
/// horizons, so every environment step still yields exactly one (possibly
/// zero- or multi-entry) item.
///
/// Agents consuming these transitions bootstrap with `gamma^n` instead of
/// `gamma`.
///
/// With `n_step == 1` the processor behaves exactly like
/// [`OneStepProcessor`].
pub struct NStepProcessor<E, O, A> {
    n_step: usize,

    /// `gamma^k` for `k < n_step`.
    discount: Vec<f32>,

    prev_obs: Option<O>,
    obs_act: VecDeque<(O, A)>,
    rewards: VecDeque<f32>,
    phantom: PhantomData<E>,
}

impl<E, O, A> NStepProcessor<E, O, A> {
    /// Reward of the oldest queued pair, folded over the queued rewards.
    fn fold_reward(&mut self) -> f32 {
        let reward = self
            .rewards
            .iter()
            .zip(self.discount.iter())
            .map(|(r, d)| r * d)
            .sum();
        self.rewards.pop_front();
        reward
    }
}

impl<E, O, A> StepProcessor<E> for NStepProcessor<E, O, A>
where
    E: Env,
    O: SubBatch + From<E::Obs>,
    A: SubBatch + From<E::Act>,
{
    type Config = NStepProcessorConfig;
    type Output = Minibatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        assert!(config.n_step >= 1);
        Self {
            n_step: config.n_step,
            discount: (0..config.n_step)
                .map(|k| (config.gamma as f32).powi(k as i32))
                .collect(),
            prev_obs: None,
            obs_act: VecDeque::with_capacity(config.n_step),
            rewards: VecDeque::with_capacity(config.n_step),
            phantom: PhantomData,
        }
    }

    fn reset(&mut self, init_obs: E::Obs) {
        self.prev_obs = Some(init_obs.into());
        self.obs_act.clear();
        self.rewards.clear();
    }

    /// Queues `step` and emits all transitions that became complete.
    ///
    /// # Panics
    ///
    /// Panics if [`StepProcessor::reset`] was not called first.
    fn process(&mut self, step: Step<E>) -> Self::Output {
        assert_eq!(step.obs.len(), 1);

        let is_done = step.is_done();
        let obs = self
            .prev_obs
            .take()
            .expect("NStepProcessor::process() called before reset()");
        self.obs_act.push_back((obs, step.act.into()));
        self.rewards.push_back(step.reward[0]);

        let next_obs = O::from(step.obs.clone());
        let n_out = if is_done {
            self.obs_act.len()
        } else if self.obs_act.len() == self.n_step {
            1
        } else {
            0
        };

        let mut out: Minibatch<O, A> = Minibatch::with_capacity(n_out);
        for j in 0..n_out {
            let (o, a) = self.obs_act.pop_front().expect("queued pair");
            let reward = self.fold_reward();
            out.obs.push(j, &o);
            out.act.push(j, &a);
            out.next_obs.push(j, &next_obs);
            out.reward.push(reward);
            out.is_terminated.push(step.is_terminated[0]);
            out.is_truncated.push(step.is_truncated[0]);
        }

        self.prev_obs = if is_done {
            step.init_obs.map(O::from)
        } else {
            Some(step.obs.into())
        };

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{CounterAct, CounterEnv, CounterObs, VecSubBatch};
    use crate::TransitionBatch;

    type NStep = NStepProcessor<CounterEnv, VecSubBatch<f32>, VecSubBatch<i64>>;
    type OneStep = OneStepProcessor<CounterEnv, VecSubBatch<f32>, VecSubBatch<i64>>;

    fn step(obs: f32, reward: f32, terminated: bool) -> Step<CounterEnv> {
        Step::new(
            CounterObs(obs),
            CounterAct(0),
            vec![reward],
            vec![terminated as i8],
            vec![0],
            (),
            if terminated { Some(CounterObs(0.0)) } else { None },
        )
    }

    #[test]
    fn one_step_transitions_chain() {
        let mut proc = OneStep::build(&OneStepProcessorConfig::default());
        proc.reset(CounterObs(0.0));

        let b = proc.process(step(1.0, 0.5, false));
        assert_eq!(b.len(), 1);
        assert_eq!(b.obs.data(), &[0.0]);
        assert_eq!(b.next_obs.data(), &[1.0]);
        assert_eq!(b.reward, vec![0.5]);

        let b = proc.process(step(2.0, 1.5, false));
        assert_eq!(b.obs.data(), &[1.0]);
        assert_eq!(b.next_obs.data(), &[2.0]);
    }

    #[test]
    fn n_step_folds_rewards() {
        let config = NStepProcessorConfig::default().n_step(3).gamma(0.5);
        let mut proc = NStep::build(&config);
        proc.reset(CounterObs(0.0));

        assert!(proc.process(step(1.0, 1.0, false)).is_empty());
        assert!(proc.process(step(2.0, 2.0, false)).is_empty());

        let b = proc.process(step(3.0, 3.0, false));
        assert_eq!(b.len(), 1);
        assert_eq!(b.obs.data(), &[0.0]);
        assert_eq!(b.next_obs.data(), &[3.0]);
        // 1 + 0.5 * 2 + 0.25 * 3
        assert_eq!(b.reward, vec![2.75]);

        let b = proc.process(step(4.0, 4.0, false));
        assert_eq!(b.len(), 1);
        assert_eq!(b.obs.data(), &[1.0]);
        assert_eq!(b.next_obs.data(), &[4.0]);
        // 2 + 0.5 * 3 + 0.25 * 4
        assert_eq!(b.reward, vec![4.5]);
    }

    #[test]
    fn episode_end_flushes_queue() {
        let config = NStepProcessorConfig::default().n_step(3).gamma(0.5);
        let mut proc = NStep::build(&config);
        proc.reset(CounterObs(0.0));

        assert!(proc.process(step(1.0, 1.0, false)).is_empty());
        let b = proc.process(step(2.0, 2.0, true));

        assert_eq!(b.len(), 2);
        assert_eq!(b.obs.data(), &[0.0, 1.0]);
        assert_eq!(b.next_obs.data(), &[2.0, 2.0]);
        assert_eq!(b.reward, vec![1.0 + 0.5 * 2.0, 2.0]);
        assert_eq!(b.is_terminated, vec![1, 1]);

        // The processor re-seeded itself from init_obs.
        let b = proc.process(step(1.0, 1.0, false));
        assert!(b.is_empty());
    }

    #[test]
    fn single_step_config_matches_one_step_processor() {
        let mut n_proc = NStep::build(&NStepProcessorConfig::default().n_step(1).gamma(0.9));
        let mut one_proc = OneStep::build(&OneStepProcessorConfig::default());
        n_proc.reset(CounterObs(0.0));
        one_proc.reset(CounterObs(0.0));

        for t in 0..5 {
            let terminated = t == 4;
            let a = n_proc.process(step(t as f32 + 1.0, t as f32, terminated));
            let b = one_proc.process(step(t as f32 + 1.0, t as f32, terminated));
            assert_eq!(a.len(), 1);
            assert_eq!(a.reward, b.reward);
            assert_eq!(a.obs.data(), b.obs.data());
            assert_eq!(a.next_obs.data(), b.next_obs.data());
            assert_eq!(a.is_terminated, b.is_terminated);
        }
    }
}
