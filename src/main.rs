use pulseboard::{Dashboard, Size, Surface, SurfaceFactory, SurfaceOptions, logger};

use data::SAVED_STATE_PATH;
use data::aligned::AlignedBuffer;
use data::retention::padded_value_range;
use wire::adapter::flat::TelemetryPoint;
use wire::adapter::otlp::ExportMetricsServiceRequest;
use wire::adapter::tick::PriceTick;
use wire::{Event, StreamName};

use serde::Deserialize;
use std::cell::RefCell;
use std::io::BufRead;
use std::rc::Rc;

/// One line of the replay feed. The live transport (out of scope)
/// delivers the same payloads as socket callbacks; here they arrive as
/// JSON lines from a file or stdin.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FeedMessage {
    Tick(PriceTick),
    Otlp(ExportMetricsServiceRequest),
    Point(TelemetryPoint),
    Resize {
        stream: String,
        width: f32,
        height: f32,
    },
    End {
        stream: String,
    },
}

/// Stand-in rendering surface for headless replay: logs what a real
/// plot would draw.
struct HeadlessSurface {
    title: String,
}

impl Surface for HeadlessSurface {
    fn set_data(&mut self, data: &AlignedBuffer) {
        let y_range = data
            .value_range(f64::NEG_INFINITY, f64::INFINITY)
            .map(|(min, max)| padded_value_range(min, max));

        log::debug!(
            "[{}] {} points x {} series, y {:?}",
            self.title,
            data.len(),
            data.series_count(),
            y_range,
        );
    }

    fn set_size(&mut self, size: Size) {
        log::debug!("[{}] resized to {}x{}", self.title, size.width, size.height);
    }

    fn destroy(&mut self) {
        log::debug!("[{}] surface destroyed", self.title);
    }
}

struct HeadlessFactory;

impl SurfaceFactory for HeadlessFactory {
    fn create(
        &mut self,
        options: &SurfaceOptions,
        size: Size,
        data: &AlignedBuffer,
    ) -> Box<dyn Surface> {
        log::info!(
            "[{}] surface created at {}x{} with {} points, series: {:?}",
            options.title,
            size.width,
            size.height,
            data.len(),
            options.series_labels,
        );
        Box::new(HeadlessSurface {
            title: options.title.clone(),
        })
    }
}

fn main() {
    logger::setup(cfg!(debug_assertions)).expect("Failed to initialize logger");

    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map_or_else(
            || "unknown location".to_string(),
            |loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()),
        );
        let msg = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        log::error!("PANIC at {location}: {msg}");
        eprintln!("PANIC at {location}: {msg}");
    }));

    let saved_state = match data::read_from_file(SAVED_STATE_PATH) {
        Ok(state) => state,
        Err(err) => {
            log::info!("no saved state loaded: {err}");
            data::State::default()
        }
    };

    let factory = Rc::new(RefCell::new(HeadlessFactory));
    let mut dashboard = Dashboard::new(saved_state, factory);

    let feed: Box<dyn BufRead> = match std::env::args().nth(1) {
        Some(path) => match std::fs::File::open(&path) {
            Ok(file) => Box::new(std::io::BufReader::new(file)),
            Err(err) => {
                log::error!("cannot open feed file {path:?}: {err}");
                std::process::exit(1);
            }
        },
        None => Box::new(std::io::stdin().lock()),
    };

    for line in feed.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::error!("feed read error: {err}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<FeedMessage>(&line) {
            Ok(message) => dispatch(&mut dashboard, message),
            Err(err) => log::warn!("skipping malformed feed line: {err}"),
        }
    }

    for stream in dashboard.streams() {
        let state = if stream.has_data() {
            format!(
                "{} points, {} series",
                stream.buffer().len(),
                stream.series_keys().len()
            )
        } else {
            "waiting for data".to_string()
        };
        log::info!("{}: {state}", stream.name());
    }

    if let Err(err) = data::save_state(&dashboard.to_state()) {
        log::warn!("{err}");
    }
}

fn dispatch(dashboard: &mut Dashboard, message: FeedMessage) {
    match message {
        FeedMessage::Tick(tick) => match tick.normalize() {
            Ok(event) => dashboard.on_event(event),
            Err(err) => log::debug!("dropping tick: {err}"),
        },
        FeedMessage::Otlp(request) => {
            for event in request.snapshots() {
                dashboard.on_event(event);
            }
        }
        FeedMessage::Point(point) => match point.normalize() {
            Ok(event) => dashboard.on_event(event),
            Err(err) => log::debug!("dropping telemetry point: {err}"),
        },
        FeedMessage::Resize {
            stream,
            width,
            height,
        } => match StreamName::new(&stream) {
            Ok(name) => dashboard.resize(name, Size { width, height }),
            Err(err) => log::debug!("dropping resize: {err}"),
        },
        FeedMessage::End { stream } => match StreamName::new(&stream) {
            Ok(name) => dashboard.on_event(Event::StreamEnd(name)),
            Err(err) => log::debug!("dropping stream end: {err}"),
        },
    }
}
