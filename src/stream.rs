use crate::handle::{RenderHandle, Size, SurfaceFactory, SurfaceOptions};

use data::aligned::AlignedBuffer;
use data::registry::SeriesRegistry;
use data::retention::Retention;
use wire::{MetricMeta, Sample, StreamName};

use std::cell::RefCell;
use std::rc::Rc;

/// One logical stream (a symbol or a metric name) and everything it
/// owns: key registry, aligned buffer, retention policy, render handle.
///
/// Samples mutate this state in place, in the order their ingestion
/// callback fires; there is no snapshot taken at subscription time, so
/// a second event arriving before a render commit always builds on the
/// latest ingested state.
pub struct ChartStream {
    name: StreamName,
    title: Option<String>,
    unit: Option<String>,
    registry: SeriesRegistry,
    buffer: AlignedBuffer,
    retention: Retention,
    handle: RenderHandle,
    // scratch, reused across appends
    slots: Vec<Option<f64>>,
    chunk: AlignedBuffer,
    ended: bool,
}

impl ChartStream {
    pub fn new(
        name: StreamName,
        title: Option<String>,
        retention: Retention,
        factory: Rc<RefCell<dyn SurfaceFactory>>,
    ) -> Self {
        Self {
            name,
            title,
            unit: None,
            registry: SeriesRegistry::new(),
            buffer: AlignedBuffer::new(),
            retention,
            handle: RenderHandle::new(factory, retention),
            slots: Vec::new(),
            chunk: AlignedBuffer::new(),
            ended: false,
        }
    }

    pub fn name(&self) -> StreamName {
        self.name
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// False means "waiting for data" — the only degraded state this
    /// stream ever exposes.
    pub fn has_data(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &AlignedBuffer {
        &self.buffer
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    pub fn series_keys(&self) -> &[std::sync::Arc<str>] {
        self.registry.keys()
    }

    /// A key's buffered values, aligned with `buffer().timeline()`.
    pub fn series(&self, key: &str) -> Option<&[f64]> {
        self.registry
            .slot_of(key)
            .and_then(|slot| self.buffer.series(slot))
    }

    /// The x-range the renderer shows right now.
    pub fn visible_range(&self) -> Option<(f64, f64)> {
        self.retention.visible_range(self.buffer.timeline())
    }

    /// Ingest one validated-or-dropped sample: resolve keys, append with
    /// NaN gap fill, trim per retention, push the new column to the
    /// render handle.
    pub fn apply_sample(&mut self, sample: &Sample) {
        if self.ended {
            log::debug!("stream {}: dropping sample after end", self.name);
            return;
        }
        if let Err(err) = sample.validate() {
            log::debug!("stream {}: dropping sample: {err}", self.name);
            return;
        }

        let introduced = self.registry.resolve(sample, &mut self.slots);

        if let Err(err) = self.buffer.append(sample.timestamp, &self.slots) {
            log::debug!("stream {}: dropping sample: {err}", self.name);
            return;
        }
        let n = self.retention.trim_count(self.buffer.timeline());
        self.buffer.trim(n);

        if introduced {
            self.handle.set_options(self.surface_options());
        }

        // the appended column is the chunk; the handle keeps its own copy
        self.chunk.clear();
        if self.chunk.append(sample.timestamp, &self.slots).is_ok() {
            self.handle.push(&self.chunk);
        }
    }

    /// Adopt metadata from a snapshot batch. Only the first unit seen
    /// sticks; a change in render options reaches the surface at its
    /// next rebuild.
    pub fn update_meta(&mut self, meta: &MetricMeta) {
        if self.unit.is_none() && meta.unit.is_some() {
            self.unit = meta.unit.clone();
            self.handle.set_options(self.surface_options());
        }
    }

    pub fn resize(&mut self, size: Size) {
        if self.ended {
            return;
        }
        self.handle.resize(size);
    }

    /// Synchronously stop accepting pushes and release the renderer.
    /// Idempotent; late events after this are dropped by the liveness
    /// guard in `apply_sample`.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.handle.destroy();
    }

    pub fn handle(&self) -> &RenderHandle {
        &self.handle
    }

    fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            title: self
                .title
                .clone()
                .unwrap_or_else(|| self.name.to_string()),
            unit: self.unit.clone(),
            series_labels: self.registry.keys().iter().map(|k| k.to_string()).collect(),
            show_legend: self.registry.len() > 1,
            visible_window_secs: self.retention.visible_window_secs(),
        }
    }
}
