pub mod adapter;

pub use adapter::{Event, IngestError};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::fmt;

/// Series key used when a datapoint carries no distinguishing label.
pub const DEFAULT_SERIES_KEY: &str = "value";

/// Compact identity of one logical stream: a ticker symbol ("BTCUSDT")
/// or a metric name ("http_request_duration_seconds").
///
/// Stored inline so stream maps stay `Copy`-keyed; wire input that does
/// not fit is rejected at the adapter boundary instead of truncated.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamName {
    bytes: [u8; StreamName::MAX_LEN as usize],
}

impl StreamName {
    const MAX_LEN: u8 = 48;

    pub fn new(name: &str) -> Result<Self, IngestError> {
        if name.is_empty()
            || name.len() > Self::MAX_LEN as usize
            || !name.is_ascii()
            || name.bytes().any(|b| b == 0)
        {
            return Err(IngestError::InvalidStreamName(name.to_string()));
        }

        let mut bytes = [0u8; Self::MAX_LEN as usize];
        bytes[..name.len()].copy_from_slice(name.as_bytes());

        Ok(StreamName { bytes })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        let end = self
            .bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(Self::MAX_LEN as usize);
        std::str::from_utf8(&self.bytes[..end]).unwrap()
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamName({})", self.as_str())
    }
}

impl Serialize for StreamName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StreamName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        StreamName::new(&s).map_err(serde::de::Error::custom)
    }
}

/// One normalized observation: a timestamp in seconds since the unix
/// epoch and a non-empty set of `(series key, value)` pairs.
///
/// Pairs keep arrival order; duplicate keys are collapsed
/// last-write-wins by `push_value`, so consumers see each key once.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub values: Vec<(String, f64)>,
}

impl Sample {
    pub fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            values: Vec::new(),
        }
    }

    pub fn single(timestamp: f64, key: &str, value: f64) -> Self {
        Self {
            timestamp,
            values: vec![(key.to_string(), value)],
        }
    }

    /// Insert or overwrite a value for `key` (last-write-per-key-wins).
    pub fn push_value(&mut self, key: &str, value: f64) {
        if let Some(slot) = self.values.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.values.push((key.to_string(), value));
        }
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if !self.timestamp.is_finite() {
            return Err(IngestError::NonFiniteTimestamp(self.timestamp));
        }
        if self.values.is_empty() {
            return Err(IngestError::EmptyValues);
        }
        Ok(())
    }
}

/// Stream-level metadata carried alongside metric snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricMeta {
    pub unit: Option<String>,
}

impl MetricMeta {
    pub fn with_unit(unit: Option<&str>) -> Self {
        Self {
            unit: unit.filter(|u| !u.is_empty()).map(str::to_string),
        }
    }
}
