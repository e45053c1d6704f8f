//! Fixed-length trajectory store for on-policy learning.
use super::Minibatch;
use crate::{error::ReboundError, ExperienceBuffer, ReplayBuffer, SubBatch, TransitionBatch};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`RolloutBuffer`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RolloutBufferConfig {
    /// Length of a rollout: the number of environment steps collected
    /// between optimization phases.
    pub capacity: usize,
}

impl Default for RolloutBufferConfig {
    fn default() -> Self {
        Self { capacity: 2048 }
    }
}

impl RolloutBufferConfig {
    /// Sets the rollout length.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Ok(config)
    }

    /// Saves the configuration as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// A fixed-length store of on-policy trajectories.
///
/// Unlike [`TransitionBuffer`](super::TransitionBuffer), this store never
/// overwrites: transitions are collected in temporal order until the buffer
/// is full, and [`ReplayBuffer::batch`] drains everything at once. On-policy
/// algorithms train on each transition exactly once, so the trainer is
/// expected to run an optimization phase every `capacity` environment steps
/// (set its optimization interval to the rollout length).
///
/// Per-step extras such as log-probabilities or value estimates travel
/// inside the action column `A`, whose layout is algorithm-defined.
pub struct RolloutBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    capacity: usize,
    len: usize,
    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,
}

impl<O, A> RolloutBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    /// Returns `true` once the rollout is complete and must be drained.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }
}

impl<O, A> ExperienceBuffer for RolloutBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    type Item = Minibatch<O, A>;

    fn len(&self) -> usize {
        self.len
    }

    /// Appends the transitions of `item` in temporal order.
    ///
    /// Returns [`ReboundError::RolloutOverflow`] if the rollout would exceed
    /// its length; the buffer must be drained first.
    fn push(&mut self, item: Self::Item) -> Result<()> {
        let n = item.len();
        if self.len + n > self.capacity {
            return Err(ReboundError::RolloutOverflow(self.capacity).into());
        }
        let (obs, act, next_obs, reward, is_terminated, is_truncated, _, _) = item.unpack();

        self.obs.push(self.len, &obs);
        self.act.push(self.len, &act);
        self.next_obs.push(self.len, &next_obs);
        self.reward[self.len..self.len + n].copy_from_slice(&reward);
        self.is_terminated[self.len..self.len + n].copy_from_slice(&is_terminated);
        self.is_truncated[self.len..self.len + n].copy_from_slice(&is_truncated);
        self.len += n;

        Ok(())
    }
}

impl<O, A> ReplayBuffer for RolloutBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    type Config = RolloutBufferConfig;
    type Batch = Minibatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;
        Self {
            capacity,
            len: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            is_truncated: vec![0; capacity],
        }
    }

    /// Drains the buffer: returns all stored transitions in insertion order
    /// and empties the store. The requested size is ignored.
    fn batch(&mut self, _size: usize) -> Result<Self::Batch> {
        if self.len == 0 {
            return Err(ReboundError::EmptyBuffer.into());
        }

        let ixs = (0..self.len).collect::<Vec<_>>();
        let batch = Minibatch {
            obs: self.obs.sample(&ixs),
            act: self.act.sample(&ixs),
            next_obs: self.next_obs.sample(&ixs),
            reward: self.reward[..self.len].to_vec(),
            is_terminated: self.is_terminated[..self.len].to_vec(),
            is_truncated: self.is_truncated[..self.len].to_vec(),
            ix_sample: None,
            weight: None,
        };
        self.len = 0;

        Ok(batch)
    }

    /// On-policy rollouts carry no priorities.
    fn update_priority(&mut self, _ixs: &Option<Vec<usize>>, _td_errs: &Option<Vec<f32>>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::VecSubBatch;

    type Buffer = RolloutBuffer<VecSubBatch<f32>, VecSubBatch<i64>>;

    fn transition(v: f32) -> Minibatch<VecSubBatch<f32>, VecSubBatch<i64>> {
        Minibatch {
            obs: VecSubBatch::from_vec(vec![v]),
            act: VecSubBatch::from_vec(vec![v as i64]),
            next_obs: VecSubBatch::from_vec(vec![v + 1.0]),
            reward: vec![v],
            is_terminated: vec![0],
            is_truncated: vec![0],
            ix_sample: None,
            weight: None,
        }
    }

    #[test]
    fn drains_in_insertion_order() {
        let config = RolloutBufferConfig::default().capacity(4);
        let mut buffer = Buffer::build(&config);

        for v in 0..4 {
            buffer.push(transition(v as f32)).unwrap();
        }
        assert!(buffer.is_full());

        let batch = buffer.batch(0).unwrap();
        assert_eq!(batch.reward, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(batch.obs.data(), &[0.0, 1.0, 2.0, 3.0]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn overflow_is_an_error() {
        let config = RolloutBufferConfig::default().capacity(2);
        let mut buffer = Buffer::build(&config);

        buffer.push(transition(0.0)).unwrap();
        buffer.push(transition(1.0)).unwrap();
        assert!(buffer.push(transition(2.0)).is_err());

        // Draining makes room again.
        buffer.batch(0).unwrap();
        assert!(buffer.push(transition(2.0)).is_ok());
    }

    #[test]
    fn empty_drain_is_an_error() {
        let config = RolloutBufferConfig::default().capacity(2);
        let mut buffer = Buffer::build(&config);
        assert!(buffer.batch(0).is_err());
    }
}
