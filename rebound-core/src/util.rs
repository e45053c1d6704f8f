//! Utilities shared by agent implementations.
use serde::{Deserialize, Serialize};

/// Schedules target-network synchronization.
///
/// Agents keep a delayed copy of their online parameters to stabilize
/// bootstrapped targets. This scheduler counts optimization steps and
/// reports when the copy should be refreshed; the parameter update itself
/// happens at the agent's framework seam with the returned coefficient:
/// `theta_target <- tau * theta + (1 - tau) * theta_target`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SyncSchedule {
    /// Interval between synchronizations, in optimization steps.
    pub interval: usize,

    /// Soft-update coefficient; 1.0 copies the parameters outright.
    pub tau: f64,

    #[serde(skip)]
    counter: usize,
}

impl SyncSchedule {
    /// Creates a schedule with a soft-update coefficient.
    pub fn soft(interval: usize, tau: f64) -> Self {
        assert!(interval >= 1);
        Self {
            interval,
            tau,
            counter: 0,
        }
    }

    /// Creates a schedule that copies the parameters outright.
    pub fn hard(interval: usize) -> Self {
        Self::soft(interval, 1.0)
    }

    /// Counts one optimization step.
    ///
    /// Returns `Some(tau)` when a synchronization is due.
    pub fn tick(&mut self) -> Option<f64> {
        self.counter += 1;
        if self.counter >= self.interval {
            self.counter = 0;
            Some(self.tau)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SyncSchedule;

    #[test]
    fn fires_every_interval() {
        let mut schedule = SyncSchedule::hard(3);
        let fired: Vec<bool> = (0..9).map(|_| schedule.tick().is_some()).collect();
        assert_eq!(
            fired,
            vec![false, false, true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn soft_coefficient_is_reported() {
        let mut schedule = SyncSchedule::soft(1, 0.005);
        assert_eq!(schedule.tick(), Some(0.005));
        assert_eq!(schedule.tick(), Some(0.005));
    }
}
