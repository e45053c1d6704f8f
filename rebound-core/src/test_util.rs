//! Toy types for tests.
//!
//! A deterministic counter environment and plain-`Vec` column storage, used
//! by the unit and integration tests of this crate. Downstream crates may
//! find them handy for smoke tests; they are not meant for real training.
use crate::{record::Record, Act, Env, Obs, Step, SubBatch};
use anyhow::Result;

/// Column storage backed by a flat `Vec`, one element per entry.
#[derive(Clone, Debug)]
pub struct VecSubBatch<T> {
    data: Vec<T>,
}

impl<T> VecSubBatch<T> {
    /// Wraps the given elements.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    /// The stored elements.
    pub fn data(&self) -> &[T] {
        &self.data
    }
}

impl<T: Copy + Default> SubBatch for VecSubBatch<T> {
    fn new(capacity: usize) -> Self {
        Self {
            data: vec![T::default(); capacity],
        }
    }

    fn push(&mut self, ix: usize, data: &Self) {
        let capacity = self.data.len();
        for (j, v) in data.data.iter().enumerate() {
            self.data[(ix + j) % capacity] = *v;
        }
    }

    fn sample(&self, ixs: &[usize]) -> Self {
        Self {
            data: ixs.iter().map(|&ix| self.data[ix]).collect(),
        }
    }
}

/// Observation of [`CounterEnv`]: the current counter value.
#[derive(Clone, Debug)]
pub struct CounterObs(
    /// The counter value.
    pub f32,
);

impl Obs for CounterObs {
    fn len(&self) -> usize {
        1
    }
}

impl From<CounterObs> for VecSubBatch<f32> {
    fn from(obs: CounterObs) -> Self {
        Self::from_vec(vec![obs.0])
    }
}

/// Action of [`CounterEnv`]; the environment ignores it.
#[derive(Clone, Debug)]
pub struct CounterAct(
    /// The action value.
    pub i64,
);

impl Act for CounterAct {
    fn len(&self) -> usize {
        1
    }
}

impl From<CounterAct> for VecSubBatch<i64> {
    fn from(act: CounterAct) -> Self {
        Self::from_vec(vec![act.0])
    }
}

/// Configuration of [`CounterEnv`].
#[derive(Clone, Debug)]
pub struct CounterEnvConfig {
    /// Steps per episode.
    pub episode_len: usize,

    /// Counter value after a reset.
    pub init_value: f32,
}

impl Default for CounterEnvConfig {
    fn default() -> Self {
        Self {
            episode_len: 10,
            init_value: 0.0,
        }
    }
}

/// A deterministic environment counting upwards.
///
/// Every step increments the counter by one, emits the counter as both
/// observation and reward, and terminates after `episode_len` steps.
/// [`Env::reset_with_index`] starts the counter at `init_value + ix`, so
/// evaluation episodes are distinguishable.
pub struct CounterEnv {
    config: CounterEnvConfig,
    counter: f32,
    t: usize,
}

impl Env for CounterEnv {
    type Config = CounterEnvConfig;
    type Obs = CounterObs;
    type Act = CounterAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            counter: config.init_value,
            t: 0,
        })
    }

    fn step(&mut self, act: &Self::Act) -> (Step<Self>, Record) {
        self.counter += 1.0;
        self.t += 1;
        let is_terminated = (self.t >= self.config.episode_len) as i8;

        let step = Step::new(
            CounterObs(self.counter),
            act.clone(),
            vec![self.counter],
            vec![is_terminated],
            vec![0],
            (),
            None,
        );

        (step, Record::empty())
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.counter = self.config.init_value;
        self.t = 0;
        Ok(CounterObs(self.counter))
    }

    fn step_with_reset(&mut self, act: &Self::Act) -> (Step<Self>, Record) {
        let (mut step, record) = self.step(act);
        if step.is_done() {
            let init_obs = self.reset().expect("reset never fails");
            step.init_obs = Some(init_obs);
        }
        (step, record)
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.counter = self.config.init_value + ix as f32;
        self.t = 0;
        Ok(CounterObs(self.counter))
    }
}
