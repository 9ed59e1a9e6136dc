use super::{Event, IngestError};
use crate::{MetricMeta, Sample, StreamName};

use serde::Deserialize;

/// Flat telemetry point: already keyed series values sharing one
/// timestamp in unix seconds. The simplest of the inbound shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPoint {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    pub ts_unix_sec: f64,
    pub series: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeriesPoint {
    pub key: String,
    pub value: f64,
}

impl TelemetryPoint {
    pub fn normalize(&self) -> Result<Event, IngestError> {
        let stream = StreamName::new(&self.name)?;

        if !self.ts_unix_sec.is_finite() {
            return Err(IngestError::NonFiniteTimestamp(self.ts_unix_sec));
        }
        if self.series.is_empty() {
            return Err(IngestError::EmptyValues);
        }

        let mut sample = Sample::new(self.ts_unix_sec);
        for point in &self.series {
            sample.push_value(&point.key, point.value);
        }

        Ok(Event::Snapshot(
            stream,
            MetricMeta::with_unit(self.unit.as_deref()),
            sample,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes() {
        let raw = r#"{
            "name": "event_loop_lag",
            "unit": "ms",
            "tsUnixSec": 1700000000.5,
            "series": [{ "key": "p50", "value": 1.2 }, { "key": "p95", "value": 4.8 }]
        }"#;
        let point: TelemetryPoint = serde_json::from_str(raw).unwrap();

        let Event::Snapshot(stream, meta, sample) = point.normalize().unwrap() else {
            panic!("expected snapshot event");
        };
        assert_eq!(stream.as_str(), "event_loop_lag");
        assert_eq!(meta.unit.as_deref(), Some("ms"));
        assert_eq!(sample.timestamp, 1_700_000_000.5);
        assert_eq!(sample.values.len(), 2);
    }

    #[test]
    fn rejects_non_finite_timestamp() {
        let point = TelemetryPoint {
            name: "m".to_string(),
            unit: None,
            ts_unix_sec: f64::INFINITY,
            series: vec![SeriesPoint {
                key: "value".to_string(),
                value: 1.0,
            }],
        };
        assert!(matches!(
            point.normalize(),
            Err(IngestError::NonFiniteTimestamp(_))
        ));
    }

    #[test]
    fn rejects_empty_series() {
        let point = TelemetryPoint {
            name: "m".to_string(),
            unit: None,
            ts_unix_sec: 1.0,
            series: Vec::new(),
        };
        assert_eq!(point.normalize(), Err(IngestError::EmptyValues));
    }
}
