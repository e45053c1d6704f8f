//! Recording of training and evaluation metrics.
//!
//! A [`Record`] is a bag of named values produced during a training or
//! evaluation step. [`Recorder`] implementations decide where records go:
//! [`NullRecorder`] drops them, [`BufferedRecorder`] keeps them in memory
//! for inspection, and sinks like the TensorBoard recorder of the
//! `rebound-tensorboard` crate write them out, aggregating stored records
//! with [`RecordStorage`] between flushes.
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
pub use storage::RecordStorage;
