//! Records of named metric values.
use crate::error::ReboundError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};

/// A value stored in a [`Record`].
#[derive(Clone, Debug)]
pub enum RecordValue {
    /// A single value, typically a metric like a loss.
    Scalar(f32),

    /// A timestamp.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array.
    Array1(Vec<f32>),

    /// A 2-dimensional array with its shape.
    Array2(Vec<f32>, [usize; 2]),

    /// A 3-dimensional array with its shape.
    Array3(Vec<f32>, [usize; 3]),

    /// A text value.
    String(String),
}

/// A set of named values produced during a training or evaluation step.
#[derive(Debug, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record holding a single scalar.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns the value under `k`, if any.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records; on key collisions `record` wins.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Returns `true` if the record holds no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the scalar under `k`.
    pub fn get_scalar(&self, k: &str) -> Result<f32, ReboundError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(ReboundError::RecordValueType("Scalar".to_string())),
            None => Err(ReboundError::RecordKey(k.to_string())),
        }
    }

    /// Returns the 1-dimensional array under `k`.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, ReboundError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(ReboundError::RecordValueType("Array1".to_string())),
            None => Err(ReboundError::RecordKey(k.to_string())),
        }
    }

    /// Returns the 2-dimensional array under `k` with its shape.
    pub fn get_array2(&self, k: &str) -> Result<(Vec<f32>, [usize; 2]), ReboundError> {
        match self.0.get(k) {
            Some(RecordValue::Array2(v, s)) => Ok((v.clone(), *s)),
            Some(_) => Err(ReboundError::RecordValueType("Array2".to_string())),
            None => Err(ReboundError::RecordKey(k.to_string())),
        }
    }

    /// Returns the 3-dimensional array under `k` with its shape.
    pub fn get_array3(&self, k: &str) -> Result<(Vec<f32>, [usize; 3]), ReboundError> {
        match self.0.get(k) {
            Some(RecordValue::Array3(v, s)) => Ok((v.clone(), *s)),
            Some(_) => Err(ReboundError::RecordValueType("Array3".to_string())),
            None => Err(ReboundError::RecordKey(k.to_string())),
        }
    }

    /// Returns the string under `k`.
    pub fn get_string(&self, k: &str) -> Result<String, ReboundError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(ReboundError::RecordValueType("String".to_string())),
            None => Err(ReboundError::RecordKey(k.to_string())),
        }
    }
}
