//! End-to-end tests of the training loop.
use anyhow::Result;
use rebound_core::{
    record::{BufferedRecorder, Record},
    replay_buffer::{
        NStepProcessor, NStepProcessorConfig, OneStepProcessor, OneStepProcessorConfig, PerConfig,
        RolloutBuffer, RolloutBufferConfig, TransitionBuffer, TransitionBufferConfig,
    },
    test_util::{CounterAct, CounterEnv, CounterEnvConfig, VecSubBatch},
    util::SyncSchedule,
    Agent, DefaultEvaluator, Env, ExperienceBuffer, Policy, ReplayBuffer, Trainer, TrainerConfig,
    TransitionBatch,
};
use std::path::Path;
use tempdir::TempDir;

type ObsBatch = VecSubBatch<f32>;
type ActBatch = VecSubBatch<i64>;
type OffPolicyBuffer = TransitionBuffer<ObsBatch, ActBatch>;
type OnPolicyBuffer = RolloutBuffer<ObsBatch, ActBatch>;

/// An agent standing in for a Q-learning implementation: it samples
/// prioritized batches, feeds made-up TD errors back as priorities and
/// follows a target-sync schedule.
struct OffPolicyTestAgent {
    batch_size: usize,
    min_transitions: usize,
    sync: SyncSchedule,
    n_opts: usize,
    n_syncs: usize,
    train: bool,
}

impl Policy<CounterEnv> for OffPolicyTestAgent {
    fn sample(&mut self, _obs: &<CounterEnv as Env>::Obs) -> <CounterEnv as Env>::Act {
        CounterAct(0)
    }
}

impl Agent<CounterEnv, OffPolicyBuffer> for OffPolicyTestAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut OffPolicyBuffer) -> Option<Record> {
        if buffer.len() < self.min_transitions {
            return None;
        }

        let batch = buffer.batch(self.batch_size).expect("batch");
        assert_eq!(batch.len(), self.batch_size);
        let (_, _, _, reward, _, _, ix_sample, weight) = batch.unpack();
        assert!(weight.is_some(), "PER batches must carry weights");

        // Absolute rewards stand in for TD errors.
        buffer.update_priority(&ix_sample, &Some(reward));

        if self.sync.tick().is_some() {
            self.n_syncs += 1;
        }
        self.n_opts += 1;

        Some(Record::from_scalar("loss", self.n_opts as f32))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        std::fs::write(path.join("agent.txt"), self.n_opts.to_string())?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let n_opts = std::fs::read_to_string(path.join("agent.txt"))?;
        self.n_opts = n_opts.trim().parse()?;
        Ok(())
    }
}

#[test]
fn off_policy_training_loop() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let model_dir = TempDir::new("off_policy_training_loop")?;
    let model_dir_str = model_dir.path().to_str().unwrap().to_string();

    let trainer_config = TrainerConfig::default()
        .model_dir(model_dir_str)
        .max_opts(50)
        .opt_interval(2)
        .warmup_period(20)
        .eval_interval(10)
        .save_interval(25)
        .record_agent_info_interval(10)
        .flush_record_interval(10);
    let buffer_config = TransitionBufferConfig::default()
        .capacity(100)
        .per_config(Some(PerConfig::default()));
    let step_proc_config = NStepProcessorConfig::default().n_step(3).gamma(0.99);

    let mut trainer =
        Trainer::<CounterEnv, NStepProcessor<CounterEnv, ObsBatch, ActBatch>, OffPolicyBuffer>::build(
            trainer_config,
            CounterEnvConfig::default(),
            step_proc_config,
            buffer_config,
        );

    let mut agent = OffPolicyTestAgent {
        batch_size: 8,
        min_transitions: 10,
        sync: SyncSchedule::hard(4),
        n_opts: 0,
        n_syncs: 0,
        train: false,
    };
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = DefaultEvaluator::<CounterEnv>::new(&CounterEnvConfig::default(), 0, 2)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    assert_eq!(agent.n_opts, 50);
    // A hard sync every 4 optimization steps.
    assert_eq!(agent.n_syncs, 12);
    assert!(agent.is_train());
    assert!(!recorder.is_empty());

    // Best and periodic checkpoints were written.
    assert!(model_dir.path().join("best").join("agent.txt").exists());
    assert!(model_dir.path().join("25").join("agent.txt").exists());
    assert!(model_dir.path().join("50").join("agent.txt").exists());

    // Checkpoints round-trip through load_params.
    let n_opts = agent.n_opts;
    agent.n_opts = 0;
    agent.load_params(&model_dir.path().join("50"))?;
    assert_eq!(agent.n_opts, n_opts);

    Ok(())
}

/// An agent that drains full rollouts, as an on-policy implementation
/// would.
struct OnPolicyTestAgent {
    rollout_len: usize,
    n_opts: usize,
    train: bool,
}

impl Policy<CounterEnv> for OnPolicyTestAgent {
    fn sample(&mut self, _obs: &<CounterEnv as Env>::Obs) -> <CounterEnv as Env>::Act {
        CounterAct(1)
    }
}

impl Agent<CounterEnv, OnPolicyBuffer> for OnPolicyTestAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut OnPolicyBuffer) -> Option<Record> {
        assert!(buffer.is_full(), "rollout must be complete when drained");

        let batch = buffer.batch(0).expect("drained rollout");
        assert_eq!(batch.len(), self.rollout_len);
        assert!(buffer.is_empty());

        self.n_opts += 1;
        Some(Record::from_scalar("loss_actor", 0.0))
    }

    fn save_params(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn load_params(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

#[test]
fn on_policy_rollouts_are_drained_when_full() -> Result<()> {
    let rollout_len = 8;
    let trainer_config = TrainerConfig::default()
        .max_opts(5)
        .opt_interval(rollout_len);

    let mut trainer =
        Trainer::<CounterEnv, OneStepProcessor<CounterEnv, ObsBatch, ActBatch>, OnPolicyBuffer>::build(
            trainer_config,
            CounterEnvConfig::default(),
            OneStepProcessorConfig::default(),
            RolloutBufferConfig::default().capacity(rollout_len),
        );

    let mut agent = OnPolicyTestAgent {
        rollout_len,
        n_opts: 0,
        train: false,
    };
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = DefaultEvaluator::<CounterEnv>::new(&CounterEnvConfig::default(), 0, 1)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    assert_eq!(agent.n_opts, 5);

    Ok(())
}
