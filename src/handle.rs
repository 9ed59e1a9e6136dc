use data::aligned::AlignedBuffer;
use data::retention::Retention;

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Everything a surface needs besides data and geometry: derived from
/// the stream's registry, so it is rebuilt whenever the key set grows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceOptions {
    pub title: String,
    pub unit: Option<String>,
    /// Series labels in registry (first-seen) order.
    pub series_labels: Vec<String>,
    pub show_legend: bool,
    /// Visible x-span for window-following streams; None renders the
    /// full buffered span.
    pub visible_window_secs: Option<f64>,
}

/// The opaque rendering surface. Column 0 of the pushed data is the
/// timeline; columns 1..N are value series in registry order.
pub trait Surface {
    fn set_data(&mut self, data: &AlignedBuffer);
    fn set_size(&mut self, size: Size);
    fn destroy(&mut self);
}

/// Constructs surfaces once a handle has both geometry and data.
pub trait SurfaceFactory {
    fn create(
        &mut self,
        options: &SurfaceOptions,
        size: Size,
        data: &AlignedBuffer,
    ) -> Box<dyn Surface>;
}

/// Boundary object between one stream's buffer and its rendering
/// surface.
///
/// Two-phase lazy init: the surface is constructed on the first moment
/// both geometry and non-empty data are known; `push`/`resize` before
/// that are legitimate no-ops, never errors. `destroy` resets back to
/// the uninitialized state and is idempotent.
///
/// The handle retains its own copy of the pushed data (never a
/// reference into the source buffer) and re-applies the stream's
/// retention policy to that copy on every push.
pub struct RenderHandle {
    factory: Rc<RefCell<dyn SurfaceFactory>>,
    options: SurfaceOptions,
    retention: Retention,
    buffer: AlignedBuffer,
    size: Option<Size>,
    surface: Option<Box<dyn Surface>>,
    surface_series_count: usize,
}

impl RenderHandle {
    pub fn new(factory: Rc<RefCell<dyn SurfaceFactory>>, retention: Retention) -> Self {
        Self {
            factory,
            options: SurfaceOptions::default(),
            retention,
            buffer: AlignedBuffer::new(),
            size: None,
            surface: None,
            surface_series_count: 0,
        }
    }

    /// Replace the render options. Takes effect at the next (re)build;
    /// a live surface keeps its current options until the series set
    /// grows or it is destroyed.
    pub fn set_options(&mut self, options: SurfaceOptions) {
        self.options = options;
    }

    /// Append aligned columns and flush to the surface.
    ///
    /// If the chunk carries series the retained copy has not seen,
    /// their earlier history is back-filled with missing-value markers
    /// so alignment holds inside the renderer's storage too. A live
    /// surface built for fewer series is torn down and rebuilt with the
    /// full retained dataset.
    pub fn push(&mut self, chunk: &AlignedBuffer) {
        if chunk.is_empty() {
            return;
        }

        self.buffer.extend_from(chunk);
        let n = self.retention.trim_count(self.buffer.timeline());
        self.buffer.trim(n);

        match self.surface.as_mut() {
            Some(surface) => {
                if self.buffer.series_count() > self.surface_series_count {
                    surface.destroy();
                    self.surface = None;
                    self.try_create();
                } else {
                    surface.set_data(&self.buffer);
                }
            }
            None => self.try_create(),
        }
    }

    /// Record geometry; forward to a live surface, or retry lazy
    /// construction if data already arrived first.
    pub fn resize(&mut self, size: Size) {
        self.size = Some(size);

        match self.surface.as_mut() {
            Some(surface) => surface.set_size(size),
            None => self.try_create(),
        }
    }

    /// Tear down the surface and reset to uninitialized. Idempotent.
    pub fn destroy(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.destroy();
        }
        self.surface_series_count = 0;
        self.size = None;
        self.buffer.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    pub fn retained(&self) -> &AlignedBuffer {
        &self.buffer
    }

    fn try_create(&mut self) {
        if self.surface.is_some() {
            return;
        }
        let Some(size) = self.size else {
            return;
        };
        if self.buffer.is_empty() {
            return;
        }

        let surface = self
            .factory
            .borrow_mut()
            .create(&self.options, size, &self.buffer);
        self.surface_series_count = self.buffer.series_count();
        self.surface = Some(surface);
    }
}
