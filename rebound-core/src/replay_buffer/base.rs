//! Circular replay buffer with optional prioritized sampling.
use super::{config::PerConfig, BetaSchedule, Minibatch, SumTree, TransitionBufferConfig};
use crate::{error::ReboundError, ExperienceBuffer, ReplayBuffer, SubBatch, TransitionBatch};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Sampling state of prioritized experience replay.
struct PerState {
    sum_tree: SumTree,
    beta: BetaSchedule,
}

impl PerState {
    fn new(capacity: usize, config: &PerConfig) -> Self {
        Self {
            sum_tree: SumTree::new(capacity, config.alpha, config.normalize),
            beta: BetaSchedule::new(config.beta_0, config.beta_final, config.n_opts_final),
        }
    }
}

/// Writes `src` into `dst` starting at `i`, wrapping at the end.
#[inline]
fn push_column<T: Copy>(dst: &mut [T], mut i: usize, src: &[T]) {
    for v in src.iter() {
        dst[i] = *v;
        i += 1;
        if i == dst.len() {
            i = 0;
        }
    }
}

/// A fixed-capacity circular store of transitions.
///
/// The buffer keeps the most recent `capacity` transitions, overwriting the
/// oldest once full. Batches are drawn uniformly at random, or — when a
/// [`PerConfig`] is given — proportionally to transition priorities, in
/// which case each batch carries sample indices and importance-sampling
/// weights. Fresh transitions enter at the current maximal priority so they
/// are sampled at least once before their TD error is known.
///
/// Observation and action columns are stored through [`SubBatch`], so the
/// per-entry layout is defined by the caller.
pub struct TransitionBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    capacity: usize,

    /// Insertion cursor.
    i: usize,

    /// Number of stored transitions, saturating at `capacity`.
    size: usize,

    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,

    rng: StdRng,
    per: Option<PerState>,
}

impl<O, A> TransitionBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    /// Assigns the current maximal priority to `n` entries starting at the
    /// insertion cursor.
    fn prime_priorities(&mut self, n: usize) {
        if let Some(per) = &mut self.per {
            let p = per.sum_tree.max();
            for j in 0..n {
                per.sum_tree.add((self.i + j) % self.capacity, p);
            }
        }
    }

    /// Number of stored transitions with the terminated flag set.
    pub fn num_terminated_flags(&self) -> usize {
        self.is_terminated
            .iter()
            .take(self.size)
            .map(|&f| f as usize)
            .sum()
    }

    /// Number of stored transitions with the truncated flag set.
    pub fn num_truncated_flags(&self) -> usize {
        self.is_truncated
            .iter()
            .take(self.size)
            .map(|&f| f as usize)
            .sum()
    }

    /// Sum of all stored rewards.
    pub fn sum_rewards(&self) -> f32 {
        self.reward.iter().take(self.size).sum()
    }
}

impl<O, A> ExperienceBuffer for TransitionBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    type Item = Minibatch<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    /// Appends the transitions of `item` at the insertion cursor.
    ///
    /// A zero-length item is a no-op; items longer than one entry (e.g.
    /// episode-end flushes of an n-step processor) are written back to back.
    fn push(&mut self, item: Self::Item) -> Result<()> {
        let n = item.len();
        let (obs, act, next_obs, reward, is_terminated, is_truncated, _, _) = item.unpack();

        self.obs.push(self.i, &obs);
        self.act.push(self.i, &act);
        self.next_obs.push(self.i, &next_obs);
        push_column(&mut self.reward, self.i, &reward);
        push_column(&mut self.is_terminated, self.i, &is_terminated);
        push_column(&mut self.is_truncated, self.i, &is_truncated);

        self.prime_priorities(n);

        self.i = (self.i + n) % self.capacity;
        self.size = (self.size + n).min(self.capacity);

        Ok(())
    }
}

impl<O, A> ReplayBuffer for TransitionBuffer<O, A>
where
    O: SubBatch,
    A: SubBatch,
{
    type Config = TransitionBufferConfig;
    type Batch = Minibatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;
        Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            is_truncated: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
            per: config
                .per_config
                .as_ref()
                .map(|per_config| PerState::new(capacity, per_config)),
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if self.size == 0 {
            return Err(ReboundError::EmptyBuffer.into());
        }
        if size > self.size {
            return Err(ReboundError::InsufficientTransitions {
                requested: size,
                stored: self.size,
            }
            .into());
        }

        let (ixs, weight) = match &self.per {
            Some(per) => {
                let (ixs, ws) = per.sum_tree.sample(size, per.beta.value());
                (ixs, Some(ws))
            }
            None => {
                let ixs = (0..size)
                    .map(|_| self.rng.gen_range(0..self.size))
                    .collect::<Vec<_>>();
                (ixs, None)
            }
        };

        Ok(Minibatch {
            obs: self.obs.sample(&ixs),
            act: self.act.sample(&ixs),
            next_obs: self.next_obs.sample(&ixs),
            reward: ixs.iter().map(|&ix| self.reward[ix]).collect(),
            is_terminated: ixs.iter().map(|&ix| self.is_terminated[ix]).collect(),
            is_truncated: ixs.iter().map(|&ix| self.is_truncated[ix]).collect(),
            ix_sample: Some(ixs),
            weight,
        })
    }

    /// Applies absolute TD errors as new priorities and advances the
    /// `beta` schedule by one optimization step.
    fn update_priority(&mut self, ixs: &Option<Vec<usize>>, td_errs: &Option<Vec<f32>>) {
        if let Some(per) = &mut self.per {
            let ixs = ixs.as_ref().expect("sample indices for update_priority");
            let td_errs = td_errs.as_ref().expect("TD errors for update_priority");
            for (&ix, &td_err) in ixs.iter().zip(td_errs.iter()) {
                per.sum_tree.update(ix, td_err.abs());
            }
            per.beta.step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay_buffer::PerConfig;
    use crate::test_util::VecSubBatch;

    type Buffer = TransitionBuffer<VecSubBatch<f32>, VecSubBatch<i64>>;

    fn transition(v: f32, done: bool) -> Minibatch<VecSubBatch<f32>, VecSubBatch<i64>> {
        Minibatch {
            obs: VecSubBatch::from_vec(vec![v]),
            act: VecSubBatch::from_vec(vec![v as i64]),
            next_obs: VecSubBatch::from_vec(vec![v + 1.0]),
            reward: vec![v],
            is_terminated: vec![done as i8],
            is_truncated: vec![0],
            ix_sample: None,
            weight: None,
        }
    }

    #[test]
    fn overwrites_oldest_when_full() {
        let config = TransitionBufferConfig::default().capacity(4);
        let mut buffer = Buffer::build(&config);

        for v in 0..6 {
            buffer.push(transition(v as f32, false)).unwrap();
        }

        assert_eq!(buffer.len(), 4);
        // Rewards 0 and 1 were overwritten by 4 and 5.
        assert_eq!(buffer.sum_rewards(), 14.0);
    }

    #[test]
    fn bounds_are_checked() {
        let config = TransitionBufferConfig::default().capacity(8);
        let mut buffer = Buffer::build(&config);

        assert!(buffer.batch(1).is_err());

        buffer.push(transition(0.0, false)).unwrap();
        assert!(buffer.batch(2).is_err());
        assert!(buffer.batch(1).is_ok());
    }

    #[test]
    fn uniform_batches_have_no_weights() {
        let config = TransitionBufferConfig::default().capacity(16);
        let mut buffer = Buffer::build(&config);
        for v in 0..10 {
            buffer.push(transition(v as f32, false)).unwrap();
        }

        let batch = buffer.batch(5).unwrap();
        assert_eq!(batch.len(), 5);
        assert!(batch.weight.is_none());
        let ixs = batch.ix_sample.as_ref().unwrap();
        assert!(ixs.iter().all(|&ix| ix < 10));
        // Rewards equal the value the transition was built from.
        for (&ix, &r) in ixs.iter().zip(batch.reward.iter()) {
            assert_eq!(r, ix as f32);
        }
    }

    #[test]
    fn priority_updates_shift_sampling() {
        fastrand::seed(1);
        let config = TransitionBufferConfig::default()
            .capacity(8)
            .per_config(Some(PerConfig::default().alpha(1.0)));
        let mut buffer = Buffer::build(&config);
        for v in 0..4 {
            buffer.push(transition(v as f32, false)).unwrap();
        }

        let batch = buffer.batch(4).unwrap();
        assert!(batch.weight.is_some());

        // Concentrate almost all priority mass on index 2.
        buffer.update_priority(
            &Some(vec![0, 1, 2, 3]),
            &Some(vec![1e-4, 1e-4, 100.0, 1e-4]),
        );

        let mut hits = 0;
        for _ in 0..16 {
            let batch = buffer.batch(4).unwrap();
            hits += batch
                .ix_sample
                .unwrap()
                .iter()
                .filter(|&&ix| ix == 2)
                .count();
        }
        assert!(hits > 48);
    }

    #[test]
    fn counts_episode_end_flags() {
        let config = TransitionBufferConfig::default().capacity(8);
        let mut buffer = Buffer::build(&config);
        buffer.push(transition(0.0, false)).unwrap();
        buffer.push(transition(1.0, true)).unwrap();
        buffer.push(transition(2.0, true)).unwrap();

        assert_eq!(buffer.num_terminated_flags(), 2);
        assert_eq!(buffer.num_truncated_flags(), 0);
    }
}
