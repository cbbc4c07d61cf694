//! Camera server: registry and dashboard publication
//!
//! The [`CameraServer`] wires the video primitives together: it keeps the
//! name→source and name→sink registries, allocates stream-server ports
//! starting at the configured base, and publishes per-camera metadata under
//! the telemetry root.
//!
//! # Architecture
//!
//! ```text
//!                         CameraServer
//!                ┌──────────────────────────────┐
//!                │ sources: HashMap<Name,       │
//!                │   VideoSource + watcher task │
//!                │ sinks:   HashMap<Name,       │
//!                │   StreamServer | Consumer    │
//!                │ tables:  HashMap<Handle,     │
//!                │   telemetry::Table>          │
//!                │ next_port: u16               │
//!                └──────────────┬───────────────┘
//!                               │
//!            ┌──────────────────┼──────────────────┐
//!            ▼                  ▼                  ▼
//!       [VideoSource]      [FrameSink]       [/CameraPublisher]
//!       put_frame()        grab_frame()      source, connected,
//!            │                  ▲             mode, streams
//!            └── broadcast ─────┘
//! ```

pub mod config;
mod publish;
pub mod store;

pub use config::{HubConfig, DEFAULT_BASE_PORT, DEFAULT_PUBLISH_ROOT};
pub use store::CameraServer;
