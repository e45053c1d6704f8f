//! Errors of the library.
use thiserror::Error;

/// Errors raised by buffers and records.
#[derive(Debug, Error)]
pub enum ReboundError {
    /// The requested key does not exist in a [`Record`](crate::record::Record).
    #[error("record key not found: {0}")]
    RecordKey(String),

    /// The value under the requested key has another type.
    #[error("record value is not a {0}")]
    RecordValueType(String),

    /// A batch was requested from a buffer that holds no transitions.
    #[error("replay buffer is empty")]
    EmptyBuffer,

    /// A batch larger than the number of stored transitions was requested.
    #[error("batch size {requested} exceeds the {stored} stored transitions")]
    InsufficientTransitions {
        /// Requested batch size.
        requested: usize,
        /// Number of transitions currently stored.
        stored: usize,
    },

    /// More transitions were pushed into a rollout buffer than it can hold
    /// before being drained.
    #[error("rollout buffer overflow: capacity {0}")]
    RolloutOverflow(usize),
}
