//! Aggregation of stored records.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

fn min(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(*vs.iter().min_by(|x, y| x.total_cmp(y)).expect("values"))
}

fn max(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(*vs.iter().max_by(|x, y| x.total_cmp(y)).expect("values"))
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

/// Collects records and aggregates them by key.
///
/// Scalar keys occurring in several records are condensed into
/// `{key}_min`, `{key}_max`, `{key}_mean` and `{key}_median`; a key seen
/// once keeps its name and value. For every other value type the most
/// recent occurrence wins.
pub struct RecordStorage {
    data: Vec<Record>,
}

impl Default for RecordStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    fn keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    /// The most recent non-scalar value under `key`.
    fn latest(&self, key: &str) -> Record {
        for record in self.data.iter().rev() {
            if let Some(value) = record.get(key) {
                return Record::from_slice(&[(key, value.clone())]);
            }
        }
        unreachable!("key comes from the stored records");
    }

    fn scalars(&self, key: &str) -> Record {
        let vs: Vec<f32> = self
            .data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(RecordValue::Scalar(v)) => Some(*v),
                Some(_) => panic!("expected RecordValue::Scalar for {}", key),
                None => None,
            })
            .collect();

        if vs.len() == 1 {
            Record::from_slice(&[(key.to_string(), RecordValue::Scalar(vs[0]))])
        } else {
            Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ])
        }
    }

    /// Aggregates all stored records into one and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        let keys = self.keys();
        for key in keys.iter() {
            let value = self
                .data
                .iter()
                .find_map(|r| r.get(key))
                .expect("key comes from the stored records");
            let r = match value {
                RecordValue::Scalar(..) => self.scalars(key),
                _ => self.latest(key),
            };
            record = record.merge(r);
        }

        self.data = vec![];

        record
    }
}

#[cfg(test)]
mod tests {
    use super::RecordStorage;
    use crate::record::Record;

    #[test]
    fn repeated_scalars_are_condensed() {
        let mut storage = RecordStorage::new();
        for v in [1.0f32, 2.0, 3.0, 4.0] {
            storage.store(Record::from_scalar("loss", v));
        }
        storage.store(Record::from_scalar("eval_reward", 10.0));

        let agg = storage.aggregate();
        assert_eq!(agg.get_scalar("loss_min").unwrap(), 1.0);
        assert_eq!(agg.get_scalar("loss_max").unwrap(), 4.0);
        assert_eq!(agg.get_scalar("loss_mean").unwrap(), 2.5);
        assert_eq!(agg.get_scalar("loss_median").unwrap(), 3.0);
        // A key seen once keeps its name.
        assert_eq!(agg.get_scalar("eval_reward").unwrap(), 10.0);

        // Aggregation clears the storage.
        storage.store(Record::from_scalar("loss", 5.0));
        let agg = storage.aggregate();
        assert_eq!(agg.get_scalar("loss").unwrap(), 5.0);
    }
}
