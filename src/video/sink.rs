//! Sinks: frame consumers and MJPEG stream server handles
//!
//! Two consumer endpoints exist: [`FrameSink`] pulls frames out of a source
//! for local processing, and [`StreamServer`] represents an MJPEG streaming
//! endpoint bound to a source. The server handle owns port and binding
//! bookkeeping only; the HTTP serving engine lives outside this crate.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::error::{Error, Result};

use super::frame::Frame;
use super::source::{SourceHandle, VideoSource};

static NEXT_SINK_HANDLE: AtomicU32 = AtomicU32::new(1);

/// Opaque identifier for a sink or stream server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkHandle(pub u32);

fn next_handle() -> SinkHandle {
    SinkHandle(NEXT_SINK_HANDLE.fetch_add(1, Ordering::Relaxed))
}

/// Frame consumer bound to a single source
///
/// Owns its broadcast receiver, so it is not `Clone`; ask the camera server
/// for another sink if a second consumer is needed. A sink only sees frames
/// sent after it was created, and it does not keep the source alive: once
/// every handle to the source is dropped, grabs fail with
/// [`Error::SourceClosed`].
pub struct FrameSink {
    handle: SinkHandle,
    name: String,
    source_name: String,
    source_handle: SourceHandle,
    rx: broadcast::Receiver<Frame>,
}

impl FrameSink {
    /// Create a sink attached to `source`
    pub fn attach(name: impl Into<String>, source: &VideoSource) -> Self {
        Self {
            handle: next_handle(),
            name: name.into(),
            source_name: source.name().to_string(),
            source_handle: source.handle(),
            rx: source.subscribe_frames(),
        }
    }

    /// Unique handle of this sink
    pub fn handle(&self) -> SinkHandle {
        self.handle
    }

    /// Sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the source this sink consumes from
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Handle of the source this sink consumes from
    pub fn source_handle(&self) -> SourceHandle {
        self.source_handle
    }

    /// Wait for the next frame
    ///
    /// A slow consumer that falls behind the channel capacity skips the
    /// missed frames and resumes at the most recent one, the right behavior
    /// for live video. Returns [`Error::SourceClosed`] once the source is
    /// dropped.
    pub async fn grab_frame(&mut self) -> Result<Frame> {
        loop {
            match self.rx.recv().await {
                Ok(frame) => return Ok(frame),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        sink = %self.name,
                        skipped = skipped,
                        "Sink lagged, skipping to latest frame"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(Error::SourceClosed(self.source_name.clone()));
                }
            }
        }
    }

    /// Wait for the next frame, giving up after `timeout`
    pub async fn grab_frame_timeout(&mut self, timeout: Duration) -> Result<Frame> {
        match tokio::time::timeout(timeout, self.grab_frame()).await {
            Ok(result) => result,
            Err(_) => Err(Error::FrameTimeout(self.source_name.clone())),
        }
    }
}

impl std::fmt::Debug for FrameSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSink")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("source", &self.source_name)
            .finish()
    }
}

struct ServerInner {
    handle: SinkHandle,
    name: String,
    port: u16,
    source: RwLock<Option<VideoSource>>,
}

/// MJPEG stream server handle
///
/// Cheap-clone bookkeeping over a streaming endpoint: the assigned port and
/// the source it serves. Dashboard clients learn about the endpoint through
/// the URLs published under the camera's table.
#[derive(Clone)]
pub struct StreamServer {
    inner: Arc<ServerInner>,
}

impl StreamServer {
    /// Create a server handle on the given port
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            inner: Arc::new(ServerInner {
                handle: next_handle(),
                name: name.into(),
                port,
                source: RwLock::new(None),
            }),
        }
    }

    /// Unique handle of this server
    pub fn handle(&self) -> SinkHandle {
        self.inner.handle
    }

    /// Server name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Port the server streams on
    pub fn port(&self) -> u16 {
        self.inner.port
    }

    /// The source currently being served, if any
    pub fn source(&self) -> Option<VideoSource> {
        self.inner
            .source
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Bind the server to a source (or unbind with `None`)
    pub fn set_source(&self, source: Option<VideoSource>) {
        *self
            .inner
            .source
            .write()
            .unwrap_or_else(|e| e.into_inner()) = source;
    }

    /// Whether this server serves the given source
    pub fn serves(&self, source: &VideoSource) -> bool {
        self.source()
            .map(|bound| bound.same_source(source))
            .unwrap_or(false)
    }

    /// Stream URL for one address, in the scheme dashboards expect
    pub fn url(&self, address: &str) -> String {
        format!("mjpg:http://{}:{}/?action=stream", address, self.inner.port)
    }

    /// Stream URLs for every configured address
    pub fn urls(&self, addresses: &[String]) -> Vec<String> {
        addresses.iter().map(|addr| self.url(addr)).collect()
    }
}

impl std::fmt::Debug for StreamServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamServer")
            .field("handle", &self.inner.handle)
            .field("name", &self.inner.name)
            .field("port", &self.inner.port)
            .field(
                "source",
                &self.source().map(|s| s.name().to_string()),
            )
            .finish()
    }
}
