//! Camera server implementation
//!
//! The central registry that keeps named video sources and sinks, hands out
//! stream-server ports, and publishes camera metadata to the telemetry tree.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::stats::HubStats;
use crate::telemetry::Table;
use crate::video::{FrameSink, SourceHandle, StreamServer, VideoMode, VideoSource};

use super::config::HubConfig;
use super::publish;

struct SourceRecord {
    source: VideoSource,
    watcher: JoinHandle<()>,
}

enum SinkRecord {
    /// MJPEG stream server
    Server(StreamServer),
    /// Local frame consumer; only the binding is recorded, the sink itself
    /// is owned by the caller
    Consumer(SourceHandle),
}

struct Inner {
    primary_source_name: Option<String>,
    sources: HashMap<String, SourceRecord>,
    sinks: HashMap<String, SinkRecord>,
    tables: HashMap<SourceHandle, Table>,
    next_port: u16,
}

/// Camera server: source/sink registry and dashboard publisher
///
/// An explicit context object rather than a process-wide singleton: construct
/// one at the application's composition root and share it (`Arc` or a plain
/// reference) with whichever components need camera access.
///
/// Thread-safe via `RwLock`; registration and removal may be called
/// concurrently from control loops and dashboard-update loops.
pub struct CameraServer {
    config: HubConfig,
    publish_table: Table,
    inner: RwLock<Inner>,
}

impl CameraServer {
    /// Create a camera server with default configuration
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a camera server with custom configuration
    pub fn with_config(config: HubConfig) -> Self {
        let publish_table = Table::root(config.publish_root.clone());
        let next_port = config.base_port;

        Self {
            config,
            publish_table,
            inner: RwLock::new(Inner {
                primary_source_name: None,
                sources: HashMap::new(),
                sinks: HashMap::new(),
                tables: HashMap::new(),
                next_port,
            }),
        }
    }

    /// Get the server configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Root of the telemetry tree camera metadata is published under
    ///
    /// Watch it to bridge publications onto a dashboard transport.
    pub fn publish_table(&self) -> Table {
        self.publish_table.clone()
    }

    /// Start capturing from USB device 0
    ///
    /// Registers the camera, serves it over a new MJPEG stream server, and
    /// makes it the primary feed if none is set.
    pub async fn start_automatic_capture(&self) -> VideoSource {
        self.start_automatic_capture_device(0).await
    }

    /// Start capturing from the given USB device index
    pub async fn start_automatic_capture_device(&self, device: u32) -> VideoSource {
        let name = format!("USB Camera {}", device);
        self.start_automatic_capture_named(name, device).await
    }

    /// Start capturing from a USB device index under an explicit name
    pub async fn start_automatic_capture_named(
        &self,
        name: impl Into<String>,
        device: u32,
    ) -> VideoSource {
        let source = VideoSource::usb_index(name, device);
        self.start_automatic_capture_source(&source).await;
        source
    }

    /// Start capturing from a USB device path under an explicit name
    pub async fn start_automatic_capture_path(
        &self,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> VideoSource {
        let source = VideoSource::usb_path(name, path);
        self.start_automatic_capture_source(&source).await;
        source
    }

    /// Register an already-constructed source and serve it
    ///
    /// Equivalent to [`add_camera`](Self::add_camera) followed by an
    /// auto-port stream server bound to the source.
    pub async fn start_automatic_capture_source(&self, source: &VideoSource) {
        let mut inner = self.inner.write().await;

        self.register_camera(&mut inner, source);

        // Re-registering a served name keeps its port instead of burning a
        // fresh one from the counter
        let server_name = format!("serve_{}", source.name());
        let port = match inner.sinks.get(&server_name) {
            Some(SinkRecord::Server(existing)) => existing.port(),
            _ => {
                let port = inner.next_port;
                inner.next_port += 1;
                port
            }
        };

        let server = StreamServer::new(server_name, port);
        server.set_source(Some(source.clone()));
        self.insert_server(&mut inner, server);
    }

    /// Get a frame sink on the primary feed
    ///
    /// Fails with [`Error::NoPrimarySource`] until a camera has been
    /// registered. Each call returns a fresh sink with its own receiver.
    pub async fn get_video(&self) -> Result<FrameSink> {
        let source = {
            let inner = self.inner.read().await;
            let name = inner
                .primary_source_name
                .clone()
                .ok_or(Error::NoPrimarySource)?;
            inner
                .sources
                .get(&name)
                .map(|record| record.source.clone())
                .ok_or(Error::SourceNotFound(name))?
        };

        self.get_video_from(&source).await
    }

    /// Get a frame sink on an explicit source
    pub async fn get_video_from(&self, source: &VideoSource) -> Result<FrameSink> {
        let sink_name = format!("sink_{}", source.name());
        let sink = FrameSink::attach(sink_name.clone(), source);

        let mut inner = self.inner.write().await;
        inner
            .sinks
            .insert(sink_name, SinkRecord::Consumer(source.handle()));

        tracing::debug!(source = %source.name(), "Frame sink attached");
        Ok(sink)
    }

    /// Create a generated source for injecting processed frames
    ///
    /// The source is registered and served over a new stream server, so
    /// annotated output shows up on the dashboard like any camera.
    pub async fn put_video(
        &self,
        name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> VideoSource {
        let name = name.into();
        let mode = VideoMode::default().with_resolution(width, height);
        let source = VideoSource::generated(name, mode);
        self.start_automatic_capture_source(&source).await;
        source
    }

    /// Add a stream server on the next free port
    pub async fn add_server(&self, name: impl Into<String>) -> StreamServer {
        let mut inner = self.inner.write().await;
        let port = inner.next_port;
        inner.next_port += 1;

        let server = StreamServer::new(name, port);
        self.insert_server(&mut inner, server.clone());
        server
    }

    /// Add a stream server on an explicit port
    ///
    /// Does not advance the auto-port counter.
    pub async fn add_server_on(&self, name: impl Into<String>, port: u16) -> StreamServer {
        let server = StreamServer::new(name, port);
        let mut inner = self.inner.write().await;
        self.insert_server(&mut inner, server.clone());
        server
    }

    /// Register an already-constructed stream server
    pub async fn add_server_handle(&self, server: StreamServer) {
        let mut inner = self.inner.write().await;
        self.insert_server(&mut inner, server);
    }

    /// Remove a stream server by name
    ///
    /// Unknown names are a logged no-op.
    pub async fn remove_server(&self, name: &str) {
        let mut inner = self.inner.write().await;

        match inner.sinks.get(name) {
            Some(SinkRecord::Server(_)) => {}
            Some(SinkRecord::Consumer(_)) => {
                tracing::warn!(name = %name, "Remove server: name refers to a frame sink");
                return;
            }
            None => {
                tracing::warn!(server = %name, "Remove server: not found");
                return;
            }
        }

        inner.sinks.remove(name);
        tracing::info!(server = %name, "Stream server removed");
        self.refresh_streams(&mut inner);
    }

    /// Bind a registered server to a source (or unbind with `None`)
    ///
    /// Refreshes the published stream URLs of every camera afterwards.
    pub async fn set_server_source(
        &self,
        server_name: &str,
        source: Option<&VideoSource>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;

        let server = match inner.sinks.get(server_name) {
            Some(SinkRecord::Server(server)) => server.clone(),
            _ => return Err(Error::SinkNotFound(server_name.to_string())),
        };

        server.set_source(source.cloned());
        self.refresh_streams(&mut inner);
        Ok(())
    }

    /// Register a camera without creating a server for it
    ///
    /// Becomes the primary feed if none is set. Re-registering a name
    /// replaces the previous source under that name.
    pub async fn add_camera(&self, source: &VideoSource) {
        let mut inner = self.inner.write().await;
        self.register_camera(&mut inner, source);
        self.refresh_streams(&mut inner);
    }

    /// Remove a camera by name
    ///
    /// Unknown names are a logged no-op. Removing the primary feed clears
    /// the primary designation.
    pub async fn remove_camera(&self, name: &str) {
        let mut inner = self.inner.write().await;

        match inner.sources.remove(name) {
            Some(record) => {
                record.watcher.abort();
                inner.tables.remove(&record.source.handle());

                if inner.primary_source_name.as_deref() == Some(name) {
                    inner.primary_source_name = None;
                    tracing::info!(camera = %name, "Primary camera removed");
                } else {
                    tracing::info!(camera = %name, "Camera removed");
                }
            }
            None => {
                tracing::warn!(camera = %name, "Remove camera: not found");
            }
        }
    }

    /// Look up a registered source by name
    pub async fn source(&self, name: &str) -> Option<VideoSource> {
        let inner = self.inner.read().await;
        inner.sources.get(name).map(|record| record.source.clone())
    }

    /// Name of the primary feed, if one is set
    pub async fn primary_source_name(&self) -> Option<String> {
        self.inner.read().await.primary_source_name.clone()
    }

    /// Registry counts
    pub async fn stats(&self) -> HubStats {
        let inner = self.inner.read().await;
        let stream_servers = inner
            .sinks
            .values()
            .filter(|record| matches!(record, SinkRecord::Server(_)))
            .count();

        HubStats {
            sources: inner.sources.len(),
            frame_sinks: inner.sinks.len() - stream_servers,
            stream_servers,
            next_port: inner.next_port,
        }
    }

    fn register_camera(&self, inner: &mut Inner, source: &VideoSource) {
        let name = source.name().to_string();

        let table = self.table_for(inner, source);
        publish::publish_source(&table, source);
        let watcher = publish::spawn_source_watcher(table, source);

        let record = SourceRecord {
            source: source.clone(),
            watcher,
        };

        if let Some(previous) = inner.sources.insert(name.clone(), record) {
            previous.watcher.abort();
            inner.tables.remove(&previous.source.handle());
            tracing::warn!(camera = %name, "Camera re-registered, replacing previous source");
        } else {
            tracing::info!(
                camera = %name,
                kind = %source.kind().descriptor(),
                "Camera registered"
            );
        }

        if inner.primary_source_name.is_none() {
            inner.primary_source_name = Some(name.clone());
            tracing::info!(camera = %name, "Primary camera set");
        }
    }

    fn insert_server(&self, inner: &mut Inner, server: StreamServer) {
        let name = server.name().to_string();
        let port = server.port();

        if inner
            .sinks
            .insert(name.clone(), SinkRecord::Server(server))
            .is_some()
        {
            tracing::warn!(server = %name, "Server re-registered, replacing previous entry");
        } else {
            tracing::info!(server = %name, port = port, "Stream server added");
        }

        self.refresh_streams(inner);
    }

    /// Recompute the published stream URL list of every registered camera
    fn refresh_streams(&self, inner: &mut Inner) {
        let servers: Vec<StreamServer> = inner
            .sinks
            .values()
            .filter_map(|record| match record {
                SinkRecord::Server(server) => Some(server.clone()),
                SinkRecord::Consumer(_) => None,
            })
            .collect();

        let sources: Vec<VideoSource> = inner
            .sources
            .values()
            .map(|record| record.source.clone())
            .collect();

        for source in sources {
            let urls: Vec<String> = servers
                .iter()
                .filter(|server| server.serves(&source))
                .flat_map(|server| server.urls(&self.config.addresses))
                .collect();

            let table = self.table_for(inner, &source);
            publish::publish_streams(&table, urls);
        }
    }

    fn table_for(&self, inner: &mut Inner, source: &VideoSource) -> Table {
        inner
            .tables
            .entry(source.handle())
            .or_insert_with(|| self.publish_table.subtable(source.name()))
            .clone()
    }
}

impl Default for CameraServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use tokio_test::assert_ok;

    use crate::video::{Frame, PixelFormat};

    use super::*;

    #[tokio::test]
    async fn test_first_capture_becomes_primary() {
        let server = CameraServer::new();

        let camera = server.start_automatic_capture().await;
        assert_eq!(camera.name(), "USB Camera 0");
        assert_eq!(
            server.primary_source_name().await.as_deref(),
            Some("USB Camera 0")
        );

        // get_video() binds to the primary
        let sink = server.get_video().await.unwrap();
        assert_eq!(sink.source_handle(), camera.handle());
    }

    #[tokio::test]
    async fn test_get_video_without_sources() {
        let server = CameraServer::new();
        let result = server.get_video().await;
        assert!(matches!(result, Err(Error::NoPrimarySource)));
    }

    #[tokio::test]
    async fn test_auto_ports_are_sequential() {
        let server = CameraServer::new();

        let a = server.add_server("server_a").await;
        let b = server.add_server("server_b").await;

        assert_eq!(a.port(), 1181);
        assert_eq!(b.port(), 1182);
    }

    #[tokio::test]
    async fn test_explicit_port_leaves_counter_alone() {
        let server = CameraServer::new();

        let fixed = server.add_server_on("fixed", 1300).await;
        assert_eq!(fixed.port(), 1300);

        let auto = server.add_server("auto").await;
        assert_eq!(auto.port(), 1181);
    }

    #[tokio::test]
    async fn test_remove_unknown_is_noop() {
        let server = CameraServer::new();

        server.remove_camera("never added").await;
        server.remove_server("never added").await;

        let stats = server.stats().await;
        assert_eq!(stats.sources, 0);
        assert_eq!(stats.stream_servers, 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_replaces() {
        let server = CameraServer::new();

        let first = VideoSource::usb_index("cam", 0);
        let second = VideoSource::usb_index("cam", 1);

        server.add_camera(&first).await;
        server.add_camera(&second).await;

        let stats = server.stats().await;
        assert_eq!(stats.sources, 1);

        let registered = server.source("cam").await.unwrap();
        assert!(registered.same_source(&second));
    }

    #[tokio::test]
    async fn test_reregistration_reuses_server_port() {
        let server = CameraServer::new();

        let cam = VideoSource::usb_index("cam", 0);
        server.start_automatic_capture_source(&cam).await;
        server.start_automatic_capture_source(&cam).await;

        // The replacement server kept port 1181, so the counter has only
        // advanced once
        let next = server.add_server("other").await;
        assert_eq!(next.port(), 1182);

        let streams = server
            .publish_table()
            .subtable("cam")
            .get_text_array("streams")
            .unwrap();
        assert_eq!(
            streams,
            vec!["mjpg:http://localhost:1181/?action=stream".to_string()]
        );
    }

    #[tokio::test]
    async fn test_remove_primary_clears_designation() {
        let server = CameraServer::new();

        let cam = VideoSource::usb_index("cam", 0);
        server.add_camera(&cam).await;
        assert!(server.primary_source_name().await.is_some());

        server.remove_camera("cam").await;
        assert!(server.primary_source_name().await.is_none());
        assert!(matches!(
            server.get_video().await,
            Err(Error::NoPrimarySource)
        ));
    }

    #[tokio::test]
    async fn test_put_video_end_to_end() {
        let server = CameraServer::new();

        let feed = server.put_video("Annotated", 320, 240).await;
        assert_eq!(feed.video_mode().width, 320);

        let mut sink = server.get_video_from(&feed).await.unwrap();

        feed.put_frame(Frame::new(
            Bytes::from_static(&[0u8; 16]),
            4,
            4,
            PixelFormat::Gray,
        ));

        let frame = assert_ok!(sink.grab_frame_timeout(Duration::from_secs(1)).await);
        assert_eq!(frame.len(), 16);
    }

    #[tokio::test]
    async fn test_capture_publishes_metadata() {
        let server = CameraServer::new();
        let camera = server.start_automatic_capture_named("Front", 0).await;

        let table = server.publish_table().subtable("Front");
        assert_eq!(table.get_text("source").as_deref(), Some("usb:0"));
        assert_eq!(table.get_bool("connected"), Some(false));

        // The auto-created server is bound, so one URL per address
        let streams = table.get_text_array("streams").unwrap();
        assert_eq!(
            streams,
            vec!["mjpg:http://localhost:1181/?action=stream".to_string()]
        );

        // Connection changes flow into the table via the watcher task
        camera.set_connected(true);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(table.get_bool("connected"), Some(true));
    }

    #[tokio::test]
    async fn test_binding_server_updates_streams() {
        let server = CameraServer::new();

        let cam = VideoSource::usb_index("cam", 0);
        server.add_camera(&cam).await;

        let table = server.publish_table().subtable("cam");
        assert_eq!(table.get_text_array("streams").unwrap().len(), 0);

        server.add_server("extra").await;
        server.set_server_source("extra", Some(&cam)).await.unwrap();

        let streams = table.get_text_array("streams").unwrap();
        assert_eq!(
            streams,
            vec!["mjpg:http://localhost:1181/?action=stream".to_string()]
        );

        server.remove_server("extra").await;
        assert_eq!(table.get_text_array("streams").unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_set_server_source_unknown_server() {
        let server = CameraServer::new();
        let cam = VideoSource::usb_index("cam", 0);

        let result = server.set_server_source("missing", Some(&cam)).await;
        assert!(matches!(result, Err(Error::SinkNotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_add_remove() {
        let server = Arc::new(CameraServer::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let server = Arc::clone(&server);
            handles.push(tokio::spawn(async move {
                let name = format!("cam_{}", i);
                let source = VideoSource::usb_index(name.as_str(), i);
                server.add_camera(&source).await;

                if i % 2 == 0 {
                    server.remove_camera(&name).await;
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        // Odd-numbered cameras survive; no lost updates or duplicates
        let stats = server.stats().await;
        assert_eq!(stats.sources, 8);
        for i in (1..16).step_by(2) {
            assert!(server.source(&format!("cam_{}", i)).await.is_some());
        }
    }

    #[tokio::test]
    async fn test_custom_config_addresses_and_port() {
        let config = HubConfig::default()
            .base_port(1400)
            .addresses(vec!["10.0.0.2".to_string(), "robot.local".to_string()]);
        let server = CameraServer::with_config(config);

        server.start_automatic_capture_path("Back", "/dev/video1").await;

        let table = server.publish_table().subtable("Back");
        assert_eq!(table.get_text("source").as_deref(), Some("usb:/dev/video1"));

        let streams = table.get_text_array("streams").unwrap();
        assert_eq!(
            streams,
            vec![
                "mjpg:http://10.0.0.2:1400/?action=stream".to_string(),
                "mjpg:http://robot.local:1400/?action=stream".to_string(),
            ]
        );
    }
}
