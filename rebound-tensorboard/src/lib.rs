//! TensorBoard output for training records.
use rebound_core::record::{Record, RecordStorage, Recorder, RecordValue};
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;

/// Writes records as TFRecord event files for TensorBoard.
///
/// Immediate writes take their step from the record's `opt_steps` entry,
/// falling back to an internal counter. Stored records are aggregated with
/// [`RecordStorage`] and written on [`Recorder::flush`] at the given step.
/// Only scalar values are written; other value types are skipped unless the
/// recorder was built with value checking, in which case they panic.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    storage: RecordStorage,
    step_key: String,
    n_writes: usize,
    ignore_unsupported_value: bool,
}

impl TensorboardRecorder {
    /// Constructs a recorder writing into `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            storage: RecordStorage::new(),
            step_key: "opt_steps".to_string(),
            n_writes: 0,
            ignore_unsupported_value: true,
        }
    }

    /// Constructs a recorder that panics on unsupported record values.
    pub fn new_with_check_unsupported_value<P: AsRef<Path>>(logdir: P) -> Self {
        let mut recorder = Self::new(logdir);
        recorder.ignore_unsupported_value = false;
        recorder
    }

    fn write_at(&mut self, record: Record, step: usize) {
        for (k, v) in record.iter() {
            if *k == self.step_key {
                continue;
            }
            match v {
                RecordValue::Scalar(v) => self.writer.add_scalar(k, *v, step),
                RecordValue::DateTime(_) => {}
                _ => {
                    if !self.ignore_unsupported_value {
                        panic!("unsupported record value under key {:?}", k);
                    }
                }
            }
        }
    }
}

impl Recorder for TensorboardRecorder {
    fn write(&mut self, record: Record) {
        let step = match record.get(&self.step_key) {
            Some(RecordValue::Scalar(step)) => *step as usize,
            _ => self.n_writes,
        };
        self.n_writes += 1;
        self.write_at(record, step);
    }

    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let aggregated = self.storage.aggregate();
        self.write_at(aggregated, step as usize);
        self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::TensorboardRecorder;
    use rebound_core::record::{Record, Recorder};
    use tempdir::TempDir;

    #[test]
    fn writes_event_files() {
        let logdir = TempDir::new("tensorboard_recorder").unwrap();
        let mut recorder = TensorboardRecorder::new(logdir.path());

        for v in 0..10 {
            recorder.store(Record::from_scalar("loss", v as f32));
        }
        recorder.flush(10);

        let n_files = std::fs::read_dir(logdir.path()).unwrap().count();
        assert!(n_files > 0);
    }
}
