//! Annealing of the importance-sampling exponent.
use serde::{Deserialize, Serialize};

/// Linear schedule of the importance-sampling exponent `beta` for PER.
///
/// `beta` grows from `beta_0` to `beta_final` over `n_opts_final`
/// optimization steps and stays at `beta_final` afterwards. Bias correction
/// matters most late in training, so the exponent typically starts around
/// 0.4 and ends at 1.0.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BetaSchedule {
    /// Initial value of `beta`.
    pub beta_0: f32,

    /// Final value of `beta`.
    pub beta_final: f32,

    /// Optimization step at which `beta` reaches its final value.
    pub n_opts_final: usize,

    /// Optimization steps taken so far.
    pub n_opts: usize,
}

impl BetaSchedule {
    /// Creates a schedule.
    pub fn new(beta_0: f32, beta_final: f32, n_opts_final: usize) -> Self {
        Self {
            beta_0,
            beta_final,
            n_opts_final,
            n_opts: 0,
        }
    }

    /// The current value of `beta`.
    pub fn value(&self) -> f32 {
        if self.n_opts >= self.n_opts_final {
            self.beta_final
        } else {
            let d = self.beta_final - self.beta_0;
            self.beta_0 + d * (self.n_opts as f32 / self.n_opts_final as f32)
        }
    }

    /// Advances the schedule by one optimization step.
    pub fn step(&mut self) {
        self.n_opts += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::BetaSchedule;

    #[test]
    fn anneals_linearly_and_saturates() {
        let mut schedule = BetaSchedule::new(0.4, 1.0, 10);
        assert_eq!(schedule.value(), 0.4);

        for _ in 0..5 {
            schedule.step();
        }
        assert!((schedule.value() - 0.7).abs() < 1e-6);

        for _ in 0..20 {
            schedule.step();
        }
        assert_eq!(schedule.value(), 1.0);
    }
}
