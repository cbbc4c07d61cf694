//! Video primitives: frames, modes, sources, and sinks
//!
//! Sources fan frames out to sinks over `tokio::sync::broadcast`, with pixel
//! data in reference-counted `Bytes` so many consumers share one allocation.
//! Capture devices and HTTP serving engines live outside this crate; these
//! types carry the registry-facing state for them.

pub mod frame;
pub mod mode;
pub mod sink;
pub mod source;

pub use frame::Frame;
pub use mode::{PixelFormat, VideoMode};
pub use sink::{FrameSink, SinkHandle, StreamServer};
pub use source::{SourceEvent, SourceHandle, SourceKind, VideoSource, DEFAULT_FRAME_CAPACITY};
