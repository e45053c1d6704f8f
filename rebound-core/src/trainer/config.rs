//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
///
/// All intervals except `opt_interval` and `warmup_period` are counted in
/// optimization steps; those two are counted in environment steps. The
/// intervals default to `usize::MAX`, i.e. "never".
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TrainerConfig {
    /// Directory where model checkpoints are saved. No checkpoints are
    /// written when absent.
    pub model_dir: Option<String>,

    /// The number of optimization steps after which training stops.
    pub max_opts: usize,

    /// Interval of optimization steps in environment steps. For on-policy
    /// agents, set this to the rollout length.
    pub opt_interval: usize,

    /// Environment steps before the first optimization step, giving the
    /// buffer time to fill.
    pub warmup_period: usize,

    /// Interval of evaluation in optimization steps.
    pub eval_interval: usize,

    /// Interval of periodic checkpoints in optimization steps.
    pub save_interval: usize,

    /// Interval at which agent records are kept, in optimization steps.
    pub record_agent_info_interval: usize,

    /// Interval at which computational cost (FPS, optimization steps per
    /// second) is recorded, in optimization steps.
    pub record_compute_cost_interval: usize,

    /// Interval of flushing aggregated records, in optimization steps.
    pub flush_record_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            max_opts: 0,
            opt_interval: 1,
            warmup_period: 0,
            eval_interval: usize::MAX,
            save_interval: usize::MAX,
            record_agent_info_interval: usize::MAX,
            record_compute_cost_interval: usize::MAX,
            flush_record_interval: usize::MAX,
        }
    }
}

impl TrainerConfig {
    /// Sets the checkpoint directory.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets the number of optimization steps.
    pub fn max_opts(mut self, max_opts: usize) -> Self {
        self.max_opts = max_opts;
        self
    }

    /// Sets the interval of optimization in environment steps.
    pub fn opt_interval(mut self, opt_interval: usize) -> Self {
        self.opt_interval = opt_interval;
        self
    }

    /// Sets the warmup period in environment steps.
    pub fn warmup_period(mut self, warmup_period: usize) -> Self {
        self.warmup_period = warmup_period;
        self
    }

    /// Sets the interval of evaluation in optimization steps.
    pub fn eval_interval(mut self, eval_interval: usize) -> Self {
        self.eval_interval = eval_interval;
        self
    }

    /// Sets the interval of periodic checkpoints in optimization steps.
    pub fn save_interval(mut self, save_interval: usize) -> Self {
        self.save_interval = save_interval;
        self
    }

    /// Sets the interval of keeping agent records in optimization steps.
    pub fn record_agent_info_interval(mut self, interval: usize) -> Self {
        self.record_agent_info_interval = interval;
        self
    }

    /// Sets the interval of recording computational cost in optimization
    /// steps.
    pub fn record_compute_cost_interval(mut self, interval: usize) -> Self {
        self.record_compute_cost_interval = interval;
        self
    }

    /// Sets the interval of flushing records in optimization steps.
    pub fn flush_record_interval(mut self, interval: usize) -> Self {
        self.flush_record_interval = interval;
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

#[cfg(test)]
mod tests {
    use super::TrainerConfig;
    use anyhow::Result;
    use tempdir::TempDir;

    #[test]
    fn yaml_roundtrip() -> Result<()> {
        let config = TrainerConfig::default()
            .model_dir("models/dqn")
            .max_opts(100_000)
            .opt_interval(4)
            .warmup_period(1000)
            .eval_interval(5000);

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer.yaml");
        config.save(&path)?;
        let loaded = TrainerConfig::load(&path)?;
        assert_eq!(config, loaded);
        Ok(())
    }
}
