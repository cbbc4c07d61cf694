//! Video sources
//!
//! A [`VideoSource`] is a cheap-clone handle over shared per-source state:
//! the capture mode, connection status, and the broadcast channel frames are
//! fanned out on. The handle can be constructed standalone and registered
//! with a [`crate::CameraServer`] afterwards, or created through the server's
//! `start_automatic_capture` entry points.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use tokio::sync::broadcast;

use crate::stats::SourceStats;

use super::frame::Frame;
use super::mode::VideoMode;

/// Default capacity of a source's frame broadcast channel
pub const DEFAULT_FRAME_CAPACITY: usize = 32;

/// Capacity of a source's status event channel
const EVENT_CAPACITY: usize = 16;

static NEXT_SOURCE_HANDLE: AtomicU32 = AtomicU32::new(1);

/// Opaque identifier for a video source
///
/// Unique within the process; used by the server to key the per-source
/// dashboard table cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle(pub u32);

impl std::fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source:{}", self.0)
    }
}

/// What kind of device or feed backs a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// USB camera addressed by device index
    UsbIndex(u32),
    /// USB camera addressed by device path (e.g. "/dev/video0")
    UsbPath(String),
    /// Programmatically fed frames (processed/annotated images)
    Generated,
}

impl SourceKind {
    /// Stable descriptor string published to the dashboard
    pub fn descriptor(&self) -> String {
        match self {
            SourceKind::UsbIndex(dev) => format!("usb:{}", dev),
            SourceKind::UsbPath(path) => format!("usb:{}", path),
            SourceKind::Generated => "generated:".to_string(),
        }
    }
}

/// Status change emitted by a source
///
/// The camera server folds these into the source's dashboard table so
/// connection state and mode changes are visible without polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// Source started delivering frames or the device came up
    Connected,
    /// Device went away or capture stopped
    Disconnected,
    /// Capture mode changed
    ModeChanged(VideoMode),
}

struct SourceInner {
    handle: SourceHandle,
    name: String,
    kind: SourceKind,
    description: String,
    mode: RwLock<VideoMode>,
    supported_modes: RwLock<Vec<VideoMode>>,
    connected: AtomicBool,
    frame_tx: broadcast::Sender<Frame>,
    event_tx: broadcast::Sender<SourceEvent>,
    frames: AtomicU64,
    bytes: AtomicU64,
    created_at: Instant,
}

/// Cheap-clone handle to a video source
#[derive(Clone)]
pub struct VideoSource {
    inner: Arc<SourceInner>,
}

impl VideoSource {
    /// Create a USB camera source addressed by device index
    pub fn usb_index(name: impl Into<String>, device: u32) -> Self {
        let name = name.into();
        let description = format!("USB camera on device {}", device);
        Self::build(name, SourceKind::UsbIndex(device), description)
    }

    /// Create a USB camera source addressed by device path
    pub fn usb_path(name: impl Into<String>, path: impl Into<String>) -> Self {
        let name = name.into();
        let path = path.into();
        let description = format!("USB camera at {}", path);
        Self::build(name, SourceKind::UsbPath(path), description)
    }

    /// Create a generated source fed by [`put_frame`](Self::put_frame)
    pub fn generated(name: impl Into<String>, mode: VideoMode) -> Self {
        let name = name.into();
        let description = format!("Generated feed {}", name);
        let source = Self::build(name, SourceKind::Generated, description);
        source.store_mode(mode);
        source
    }

    fn build(name: String, kind: SourceKind, description: String) -> Self {
        let (frame_tx, _) = broadcast::channel(DEFAULT_FRAME_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let handle = SourceHandle(NEXT_SOURCE_HANDLE.fetch_add(1, Ordering::Relaxed));

        Self {
            inner: Arc::new(SourceInner {
                handle,
                name,
                kind,
                description,
                mode: RwLock::new(VideoMode::default()),
                supported_modes: RwLock::new(vec![
                    VideoMode::LARGE,
                    VideoMode::MEDIUM,
                    VideoMode::SMALL,
                ]),
                connected: AtomicBool::new(false),
                frame_tx,
                event_tx,
                frames: AtomicU64::new(0),
                bytes: AtomicU64::new(0),
                created_at: Instant::now(),
            }),
        }
    }

    /// Unique handle of this source
    pub fn handle(&self) -> SourceHandle {
        self.inner.handle
    }

    /// Source name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Backing device or feed kind
    pub fn kind(&self) -> &SourceKind {
        &self.inner.kind
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.inner.description
    }

    /// Current capture mode
    pub fn video_mode(&self) -> VideoMode {
        *self.inner.mode.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Modes the source advertises to dashboard clients
    pub fn supported_modes(&self) -> Vec<VideoMode> {
        self.inner
            .supported_modes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the advertised mode list
    pub fn set_supported_modes(&self, modes: Vec<VideoMode>) {
        *self
            .inner
            .supported_modes
            .write()
            .unwrap_or_else(|e| e.into_inner()) = modes;
    }

    /// Set the capture mode and notify watchers
    pub fn set_video_mode(&self, mode: VideoMode) {
        self.store_mode(mode);
        let _ = self.inner.event_tx.send(SourceEvent::ModeChanged(mode));
        tracing::debug!(source = %self.inner.name, mode = %mode, "Video mode changed");
    }

    /// Change resolution, keeping format and frame rate
    pub fn set_resolution(&self, width: u32, height: u32) {
        let mode = self.video_mode().with_resolution(width, height);
        self.set_video_mode(mode);
    }

    /// Change frame rate, keeping format and resolution
    pub fn set_fps(&self, fps: u32) {
        let mode = self.video_mode().with_fps(fps);
        self.set_video_mode(mode);
    }

    fn store_mode(&self, mode: VideoMode) {
        *self.inner.mode.write().unwrap_or_else(|e| e.into_inner()) = mode;
    }

    /// Whether the backing device or feed is currently delivering
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Relaxed)
    }

    /// Report a connection state change
    ///
    /// No-op if the state is unchanged, so callers can report readings
    /// unconditionally without flooding watchers.
    pub fn set_connected(&self, connected: bool) {
        let prev = self.inner.connected.swap(connected, Ordering::Relaxed);
        if prev == connected {
            return;
        }

        let event = if connected {
            SourceEvent::Connected
        } else {
            SourceEvent::Disconnected
        };
        let _ = self.inner.event_tx.send(event);

        tracing::info!(
            source = %self.inner.name,
            connected = connected,
            "Source connection changed"
        );
    }

    /// Feed a frame into the source
    ///
    /// Fans the frame out to every subscribed sink. The first frame marks
    /// the source connected. Frames sent while no sink is attached are
    /// dropped, which is normal for an unwatched camera.
    pub fn put_frame(&self, frame: Frame) {
        self.inner.frames.fetch_add(1, Ordering::Relaxed);
        self.inner
            .bytes
            .fetch_add(frame.len() as u64, Ordering::Relaxed);

        if !self.is_connected() {
            self.set_connected(true);
        }

        let _ = self.inner.frame_tx.send(frame);
    }

    /// Subscribe to this source's frame fan-out
    pub fn subscribe_frames(&self) -> broadcast::Receiver<Frame> {
        self.inner.frame_tx.subscribe()
    }

    /// Subscribe to status events (connect/disconnect, mode changes)
    pub fn subscribe_events(&self) -> broadcast::Receiver<SourceEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Number of sinks currently attached to the frame fan-out
    pub fn sink_count(&self) -> usize {
        self.inner.frame_tx.receiver_count()
    }

    /// Snapshot of frame counters
    pub fn stats(&self) -> SourceStats {
        SourceStats {
            frames: self.inner.frames.load(Ordering::Relaxed),
            bytes: self.inner.bytes.load(Ordering::Relaxed),
            duration: self.inner.created_at.elapsed(),
        }
    }

    /// Whether two handles refer to the same underlying source
    pub fn same_source(&self, other: &VideoSource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSource")
            .field("handle", &self.inner.handle)
            .field("name", &self.inner.name)
            .field("kind", &self.inner.kind)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique() {
        let a = VideoSource::usb_index("a", 0);
        let b = VideoSource::usb_index("b", 1);
        assert_ne!(a.handle(), b.handle());
    }

    #[test]
    fn test_descriptors() {
        assert_eq!(VideoSource::usb_index("c", 0).kind().descriptor(), "usb:0");
        assert_eq!(
            VideoSource::usb_path("c", "/dev/video1").kind().descriptor(),
            "usb:/dev/video1"
        );
        assert_eq!(
            VideoSource::generated("c", VideoMode::SMALL).kind().descriptor(),
            "generated:"
        );
    }

    #[test]
    fn test_mode_setters_emit_events() {
        let source = VideoSource::usb_index("cam", 0);
        let mut events = source.subscribe_events();

        source.set_resolution(320, 240);
        source.set_fps(15);

        assert_eq!(source.video_mode().width, 320);
        assert_eq!(source.video_mode().fps, 15);

        match events.try_recv().unwrap() {
            SourceEvent::ModeChanged(mode) => assert_eq!(mode.height, 240),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_connected_dedup() {
        let source = VideoSource::usb_index("cam", 0);
        let mut events = source.subscribe_events();

        source.set_connected(true);
        source.set_connected(true);
        source.set_connected(false);

        assert_eq!(events.try_recv().unwrap(), SourceEvent::Connected);
        assert_eq!(events.try_recv().unwrap(), SourceEvent::Disconnected);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_put_frame_fans_out() {
        let source = VideoSource::generated("feed", VideoMode::SMALL);
        let mut rx_a = source.subscribe_frames();
        let mut rx_b = source.subscribe_frames();

        source.put_frame(Frame::black(160, 120));

        let a = rx_a.recv().await.unwrap();
        let b = rx_b.recv().await.unwrap();
        assert_eq!(a.len(), 160 * 120);
        // Both sinks share the same allocation
        assert_eq!(a.data.as_ptr(), b.data.as_ptr());

        // First frame marks the source connected
        assert!(source.is_connected());

        let stats = source.stats();
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.bytes, 160 * 120);
    }
}
