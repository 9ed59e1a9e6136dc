use super::{Event, IngestError, parse_finite_f64};
use crate::{DEFAULT_SERIES_KEY, MetricMeta, Sample, StreamName};

use serde::Deserialize;

const NANOS_PER_SEC: f64 = 1e9;

/// Attribute key whose string value names the series within a metric
/// (e.g. `"0.5"` / `"0.95"` for summary quantiles).
const SERIES_ATTRIBUTE: &str = "quantile";

/// OTLP/JSON `ExportMetricsServiceRequest`, reduced to the gauge subset
/// the dashboard subscribes to.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetricsServiceRequest {
    #[serde(default)]
    pub resource_metrics: Vec<ResourceMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetrics {
    #[serde(default)]
    pub scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeMetrics {
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub gauge: Option<Gauge>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    #[serde(default)]
    pub data_points: Vec<NumberDataPoint>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberDataPoint {
    pub time_unix_nano: String,
    #[serde(default)]
    pub as_double: Option<f64>,
    #[serde(default)]
    pub as_int: Option<String>,
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
}

impl NumberDataPoint {
    fn series_key(&self) -> &str {
        self.attributes
            .iter()
            .find(|kv| kv.key == SERIES_ATTRIBUTE)
            .and_then(|kv| kv.value.as_ref())
            .and_then(|v| v.string_value.as_deref())
            .unwrap_or(DEFAULT_SERIES_KEY)
    }

    fn value(&self) -> Result<f64, IngestError> {
        if let Some(double) = self.as_double {
            if double.is_finite() {
                return Ok(double);
            }
            return Err(IngestError::UnparseableValue(double.to_string()));
        }
        match &self.as_int {
            Some(raw) => parse_finite_f64(raw),
            None => Err(IngestError::EmptyValues),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(default)]
    pub value: Option<AnyValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnyValue {
    #[serde(default)]
    pub string_value: Option<String>,
}

impl ExportMetricsServiceRequest {
    /// Normalize one export request into per-metric snapshot events.
    ///
    /// Mirrors the subscription contract: only the first resource's first
    /// scope is inspected. Metrics with no gauge datapoints are skipped
    /// for this snapshot. Within a batch the first datapoint's
    /// `timeUnixNano` is authoritative for every series; duplicate series
    /// keys collapse last-write-wins. Datapoints whose value cannot be
    /// read as a finite number are dropped individually.
    pub fn snapshots(&self) -> Vec<Event> {
        let metrics = self
            .resource_metrics
            .first()
            .and_then(|rm| rm.scope_metrics.first())
            .map(|sm| sm.metrics.as_slice())
            .unwrap_or_default();

        let mut events = Vec::with_capacity(metrics.len());

        for metric in metrics {
            match metric.snapshot() {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(err) => {
                    log::debug!("dropping metric snapshot {:?}: {err}", metric.name);
                }
            }
        }

        events
    }
}

impl Metric {
    fn snapshot(&self) -> Result<Option<Event>, IngestError> {
        let datapoints = match &self.gauge {
            Some(gauge) if !gauge.data_points.is_empty() => &gauge.data_points,
            _ => return Ok(None),
        };

        let stream = StreamName::new(&self.name)?;
        let timestamp = parse_finite_f64(&datapoints[0].time_unix_nano)? / NANOS_PER_SEC;

        let mut sample = Sample::new(timestamp);
        for dp in datapoints {
            match dp.value() {
                Ok(value) => sample.push_value(dp.series_key(), value),
                Err(err) => {
                    log::debug!("dropping datapoint of {:?}: {err}", self.name);
                }
            }
        }
        sample.validate()?;

        Ok(Some(Event::Snapshot(
            stream,
            MetricMeta::with_unit(self.unit.as_deref()),
            sample,
        )))
    }
}
