use crate::{MetricMeta, Sample, StreamName};

pub mod flat;
pub mod otlp;
pub mod tick;

/// Why a wire sample (or one datapoint inside it) was dropped.
///
/// These never propagate past the adapter boundary: a malformed sample
/// in a live feed is logged and skipped so the stream keeps flowing.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error("non-finite timestamp: {0}")]
    NonFiniteTimestamp(f64),
    #[error("unparseable value: {0:?}")]
    UnparseableValue(String),
    #[error("sample carries no values")]
    EmptyValues,
    #[error("invalid stream name: {0:?}")]
    InvalidStreamName(String),
    #[error("parsing: {0}")]
    ParseError(String),
}

/// Inbound boundary of the engine. The transport layer (out of scope)
/// produces these; the dashboard consumes them in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A single tick-style observation for one stream.
    Sample(StreamName, Sample),
    /// A metric snapshot: all datapoints share one collection timestamp.
    Snapshot(StreamName, MetricMeta, Sample),
    /// The stream will produce no further samples.
    StreamEnd(StreamName),
}

impl Event {
    pub fn stream(&self) -> StreamName {
        match self {
            Event::Sample(name, _) | Event::Snapshot(name, _, _) | Event::StreamEnd(name) => *name,
        }
    }
}

/// Parse a decimal string into a finite f64, rejecting NaN/inf spellings.
pub(crate) fn parse_finite_f64(raw: &str) -> Result<f64, IngestError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(IngestError::UnparseableValue(raw.to_string())),
    }
}
