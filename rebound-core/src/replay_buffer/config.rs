//! Configuration of the replay buffers.
use super::{WeightNormalizer, WeightNormalizer::Batch};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of prioritized experience replay.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PerConfig {
    /// Exponent applied to priorities. 0 recovers uniform sampling.
    pub alpha: f32,

    /// Initial value of the importance-sampling exponent.
    pub beta_0: f32,

    /// Final value of the importance-sampling exponent, typically 1.0.
    pub beta_final: f32,

    /// Optimization step at which `beta` reaches its final value.
    pub n_opts_final: usize,

    /// How importance-sampling weights are normalized.
    pub normalize: WeightNormalizer,
}

impl Default for PerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta_0: 0.4,
            beta_final: 1.0,
            n_opts_final: 500_000,
            normalize: Batch,
        }
    }
}

impl PerConfig {
    /// Sets the priority exponent `alpha`.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the initial importance-sampling exponent.
    pub fn beta_0(mut self, beta_0: f32) -> Self {
        self.beta_0 = beta_0;
        self
    }

    /// Sets the final importance-sampling exponent.
    pub fn beta_final(mut self, beta_final: f32) -> Self {
        self.beta_final = beta_final;
        self
    }

    /// Sets the optimization step at which `beta` saturates.
    pub fn n_opts_final(mut self, n_opts_final: usize) -> Self {
        self.n_opts_final = n_opts_final;
        self
    }

    /// Sets the weight normalization method.
    pub fn normalize(mut self, normalize: WeightNormalizer) -> Self {
        self.normalize = normalize;
        self
    }
}

/// Configuration of [`TransitionBuffer`](super::TransitionBuffer).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TransitionBufferConfig {
    /// Maximum number of stored transitions. Once reached, the oldest
    /// transitions are overwritten.
    pub capacity: usize,

    /// Seed of the sampling RNG.
    pub seed: u64,

    /// Enables prioritized sampling when present.
    pub per_config: Option<PerConfig>,
}

impl Default for TransitionBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            seed: 42,
            per_config: None,
        }
    }
}

impl TransitionBufferConfig {
    /// Sets the capacity of the buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the seed of the sampling RNG.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the PER configuration.
    pub fn per_config(mut self, per_config: Option<PerConfig>) -> Self {
        self.per_config = per_config;
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
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn yaml_roundtrip() -> Result<()> {
        let config = TransitionBufferConfig::default()
            .capacity(1000)
            .seed(7)
            .per_config(Some(PerConfig::default().alpha(0.7)));

        let dir = TempDir::new("transition_buffer_config")?;
        let path = dir.path().join("config.yaml");
        config.save(&path)?;
        let loaded = TransitionBufferConfig::load(&path)?;
        assert_eq!(config, loaded);
        Ok(())
    }
}
