//! # camhub
//!
//! Camera capture registry and MJPEG stream publisher with dashboard
//! telemetry, for robot and embedded vision setups.
//!
//! The [`CameraServer`] is the entry point: it registers named video
//! sources, hands out frame sinks for local processing, allocates ports for
//! MJPEG stream servers, and publishes camera metadata (descriptor,
//! connection state, capture mode, stream URLs) into a hierarchical
//! telemetry tree that dashboard transports can watch.
//!
//! Capture drivers, codecs, and HTTP serving engines are deliberately out of
//! scope; this crate owns the registry, the port and table bookkeeping, and
//! the zero-copy frame fan-out between sources and sinks.
//!
//! # Quick start
//!
//! ```no_run
//! use camhub::CameraServer;
//!
//! # async fn run() -> camhub::Result<()> {
//! let server = CameraServer::new();
//!
//! // Capture from USB device 0, serve it, make it the primary feed
//! let camera = server.start_automatic_capture().await;
//! camera.set_resolution(320, 240);
//!
//! // Pull frames for local processing
//! let mut sink = server.get_video().await?;
//!
//! // Push annotated output back out as its own stream
//! let annotated = server.put_video("Annotated", 320, 240).await;
//!
//! loop {
//!     let frame = sink.grab_frame().await?;
//!     // ... process ...
//!     annotated.put_frame(frame);
//! }
//! # }
//! ```

pub mod error;
pub mod hub;
pub mod stats;
pub mod telemetry;
pub mod video;

pub use error::{Error, Result};
pub use hub::{CameraServer, HubConfig};
pub use stats::{HubStats, SourceStats};
pub use video::{
    Frame, FrameSink, PixelFormat, SinkHandle, SourceEvent, SourceHandle, SourceKind,
    StreamServer, VideoMode, VideoSource,
};
