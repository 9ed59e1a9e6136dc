use crate::handle::{Size, SurfaceFactory};
use crate::stream::ChartStream;

use data::config::{State, StreamConfig};
use data::retention::{DEFAULT_WINDOW_SECS, Retention};
use wire::{Event, MetricMeta, Sample, StreamName};

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Owns every live chart stream, keyed by symbol or metric name.
///
/// Streams are discovered from the feed itself: the first event for an
/// unknown name creates its stream, with retention taken from saved
/// state when configured, else defaulted by shape — tick streams keep a
/// fixed history depth, metric snapshots follow a moving time window.
pub struct Dashboard {
    config: State,
    factory: Rc<RefCell<dyn SurfaceFactory>>,
    streams: FxHashMap<StreamName, ChartStream>,
    // discovery order, for stable display/summary iteration
    order: Vec<StreamName>,
    // geometry that arrived before the stream's first sample
    pending_sizes: FxHashMap<StreamName, Size>,
}

impl Dashboard {
    pub fn new(config: State, factory: Rc<RefCell<dyn SurfaceFactory>>) -> Self {
        Self {
            config,
            factory,
            streams: FxHashMap::default(),
            order: Vec::new(),
            pending_sizes: FxHashMap::default(),
        }
    }

    pub fn on_event(&mut self, event: Event) {
        match event {
            Event::Sample(name, sample) => self.on_sample(name, &sample),
            Event::Snapshot(name, meta, sample) => self.on_snapshot(name, &meta, &sample),
            Event::StreamEnd(name) => self.on_stream_end(name),
        }
    }

    pub fn on_sample(&mut self, name: StreamName, sample: &Sample) {
        self.ensure_stream(name, Retention::default())
            .apply_sample(sample);
    }

    pub fn on_snapshot(&mut self, name: StreamName, meta: &MetricMeta, sample: &Sample) {
        let stream = self.ensure_stream(name, Retention::window_follow(DEFAULT_WINDOW_SECS));
        stream.update_meta(meta);
        stream.apply_sample(sample);
    }

    /// Tolerates being the very first (and only) event for a name: the
    /// stream then exists as "waiting for data", not as an error.
    pub fn on_stream_end(&mut self, name: StreamName) {
        self.ensure_stream(name, Retention::default()).end();
    }

    /// Geometry notification for one stream's container. Arriving
    /// before the stream exists is fine; the size is applied when the
    /// stream is created.
    pub fn resize(&mut self, name: StreamName, size: Size) {
        match self.streams.get_mut(&name) {
            Some(stream) => stream.resize(size),
            None => {
                self.pending_sizes.insert(name, size);
            }
        }
    }

    pub fn get(&self, name: &StreamName) -> Option<&ChartStream> {
        self.streams.get(name)
    }

    /// Streams in discovery order.
    pub fn streams(&self) -> impl Iterator<Item = &ChartStream> {
        self.order.iter().filter_map(|name| self.streams.get(name))
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Snapshot the stream set back into persistable state.
    pub fn to_state(&self) -> State {
        State {
            streams: self
                .streams()
                .map(|s| StreamConfig::new(s.name().as_str(), s.retention()))
                .collect(),
        }
    }

    fn ensure_stream(&mut self, name: StreamName, fallback: Retention) -> &mut ChartStream {
        if !self.streams.contains_key(&name) {
            let configured = self.config.stream(name.as_str());
            let retention = configured.map_or(fallback, |c| c.retention);
            let title = configured.and_then(|c| c.title.clone());

            let mut stream =
                ChartStream::new(name, title, retention, Rc::clone(&self.factory));
            if let Some(size) = self.pending_sizes.remove(&name) {
                stream.resize(size);
            }

            log::info!("stream {name} discovered ({retention:?})");
            self.order.push(name);
            self.streams.insert(name, stream);
        }

        self.streams.get_mut(&name).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{Surface, SurfaceOptions};
    use data::aligned::AlignedBuffer;
    use wire::adapter::tick::PriceTick;

    struct NullSurface;

    impl Surface for NullSurface {
        fn set_data(&mut self, _data: &AlignedBuffer) {}
        fn set_size(&mut self, _size: Size) {}
        fn destroy(&mut self) {}
    }

    struct NullFactory;

    impl SurfaceFactory for NullFactory {
        fn create(
            &mut self,
            _options: &SurfaceOptions,
            _size: Size,
            _data: &AlignedBuffer,
        ) -> Box<dyn Surface> {
            Box::new(NullSurface)
        }
    }

    fn dashboard(config: State) -> Dashboard {
        Dashboard::new(config, Rc::new(RefCell::new(NullFactory)))
    }

    fn name(s: &str) -> StreamName {
        StreamName::new(s).unwrap()
    }

    fn tick(symbol: &str, ms: u64, price: &str) -> Event {
        PriceTick {
            symbol: symbol.to_string(),
            event_time_ms: ms,
            price: price.to_string(),
        }
        .normalize()
        .unwrap()
    }

    fn capped_config(stream: &str, max_points: usize) -> State {
        State {
            streams: vec![StreamConfig::new(
                stream,
                Retention::FixedCapacity { max_points },
            )],
        }
    }

    #[test]
    fn tick_ingestion_respects_fixed_cap() {
        let mut dash = dashboard(capped_config("BTC", 2));

        dash.on_event(tick("BTC", 1000, "100.5"));
        dash.on_event(tick("BTC", 2000, "101.0"));
        dash.on_event(tick("BTC", 3000, "102.0"));

        let stream = dash.get(&name("BTC")).unwrap();
        assert_eq!(stream.buffer().timeline(), &[2.0, 3.0]);
        assert_eq!(stream.series("value").unwrap(), &[101.0, 102.0]);
    }

    #[test]
    fn malformed_tick_leaves_buffer_unchanged() {
        let mut dash = dashboard(capped_config("BTC", 2));
        dash.on_event(tick("BTC", 2000, "101.0"));
        dash.on_event(tick("BTC", 3000, "102.0"));

        // the adapter already refuses to produce an event for this tick
        let malformed = PriceTick {
            symbol: "BTC".to_string(),
            event_time_ms: 4000,
            price: "NaN".to_string(),
        };
        assert!(malformed.normalize().is_err());

        let stream = dash.get(&name("BTC")).unwrap();
        assert_eq!(stream.buffer().timeline(), &[2.0, 3.0]);
        assert_eq!(stream.series("value").unwrap(), &[101.0, 102.0]);
    }

    #[test]
    fn snapshot_batches_discover_keys_mid_stream() {
        let mut dash = dashboard(State::default());
        let meta = MetricMeta::default();

        dash.on_snapshot(name("latency"), &meta, &Sample::single(1.0, "p50", 0.1));

        let mut second = Sample::single(2.0, "p50", 0.2);
        second.push_value("p95", 0.9);
        dash.on_snapshot(name("latency"), &meta, &second);

        let stream = dash.get(&name("latency")).unwrap();
        let len = stream.buffer().len();
        let p95 = stream.series("p95").unwrap();
        assert_eq!(p95.len(), len);
        assert!(p95[0].is_nan());
        assert_eq!(p95[1], 0.9);
        assert_eq!(stream.series("p50").unwrap(), &[0.1, 0.2]);
    }

    #[test]
    fn window_follow_retains_only_recent_points() {
        let mut dash = dashboard(State {
            streams: vec![StreamConfig::new("m", Retention::window_follow(10.0))],
        });

        let meta = MetricMeta::default();
        for i in 0..=20 {
            let ts = i as f64 * 5.0;
            dash.on_snapshot(name("m"), &meta, &Sample::single(ts, "value", ts));
        }

        let stream = dash.get(&name("m")).unwrap();
        assert!(
            stream
                .buffer()
                .timeline()
                .iter()
                .all(|&ts| ts >= 100.0 - 20.0)
        );
        assert_eq!(stream.visible_range(), Some((90.0, 100.0)));
    }

    #[test]
    fn stream_end_as_first_event_is_waiting_for_data() {
        let mut dash = dashboard(State::default());
        dash.on_event(Event::StreamEnd(name("ghost")));

        let stream = dash.get(&name("ghost")).unwrap();
        assert!(stream.is_ended());
        assert!(!stream.has_data());
    }

    #[test]
    fn events_after_end_are_dropped() {
        let mut dash = dashboard(State::default());
        dash.on_event(tick("BTC", 1000, "100.0"));
        dash.on_event(Event::StreamEnd(name("BTC")));
        dash.on_event(tick("BTC", 2000, "101.0"));

        assert_eq!(dash.get(&name("BTC")).unwrap().buffer().len(), 1);
    }

    #[test]
    fn geometry_before_discovery_is_applied_at_creation() {
        let mut dash = dashboard(State::default());
        dash.resize(
            name("BTC"),
            Size {
                width: 640.0,
                height: 480.0,
            },
        );
        dash.on_event(tick("BTC", 1000, "100.0"));

        let stream = dash.get(&name("BTC")).unwrap();
        // both readiness signals present: the surface exists
        assert!(stream.handle().is_initialized());
    }

    #[test]
    fn to_state_snapshots_discovered_streams() {
        let mut dash = dashboard(State::default());
        dash.on_event(tick("BTC", 1000, "100.0"));

        let state = dash.to_state();
        assert_eq!(state.streams.len(), 1);
        assert_eq!(state.streams[0].name, "BTC");
    }
}
