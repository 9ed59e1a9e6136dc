//! Engine core of the dashboard: per-stream aligned buffers fed by
//! normalized wire samples, pushed to opaque rendering surfaces.
//!
//! Everything runs on one logical thread; each stream owns its state
//! exclusively and events apply in delivery order.

pub mod dashboard;
pub mod handle;
pub mod logger;
pub mod stream;

pub use dashboard::Dashboard;
pub use handle::{RenderHandle, Size, Surface, SurfaceFactory, SurfaceOptions};
pub use stream::ChartStream;
