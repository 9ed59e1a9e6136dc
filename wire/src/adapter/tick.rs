use super::{Event, IngestError, parse_finite_f64};
use crate::{DEFAULT_SERIES_KEY, Sample, StreamName};

use serde::Deserialize;

/// Ticker-style price tick as pushed over the chart channel.
///
/// Field names follow the upstream payload: `s` symbol, `E` event time
/// in epoch milliseconds, `c` last price as a decimal string.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceTick {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "E")]
    pub event_time_ms: u64,
    #[serde(rename = "c")]
    pub price: String,
}

impl PriceTick {
    /// Normalize into a single-series sample keyed under `"value"`.
    ///
    /// Drops the tick when the symbol is empty or the price string does
    /// not parse as a finite float; a bad tick never reaches a buffer.
    pub fn normalize(&self) -> Result<Event, IngestError> {
        let stream = StreamName::new(&self.symbol)?;
        let price = parse_finite_f64(&self.price)?;
        let timestamp = self.event_time_ms as f64 / 1000.0;

        Ok(Event::Sample(
            stream,
            Sample::single(timestamp, DEFAULT_SERIES_KEY, price),
        ))
    }
}
