//! Dashboard publication of camera metadata
//!
//! Each registered source gets a subtable under the publish root carrying
//! its descriptor, connection state, capture mode, and the stream URLs of
//! every server bound to it. A watcher task per source folds status events
//! into the table so dashboards track connect/disconnect and mode changes
//! without polling.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::telemetry::Table;
use crate::video::{SourceEvent, VideoMode, VideoSource};

/// Write the full static metadata of a source into its table
pub(super) fn publish_source(table: &Table, source: &VideoSource) {
    table.put_text("source", source.kind().descriptor());
    table.put_text("description", source.description());
    table.put_bool("connected", source.is_connected());
    table.put_text("mode", source.video_mode().to_string());
    table.put_text_array("modes", mode_strings(&source.supported_modes()));
}

/// Replace the published stream URL list of a source
pub(super) fn publish_streams(table: &Table, urls: Vec<String>) {
    table.put_text_array("streams", urls);
}

fn mode_strings(modes: &[VideoMode]) -> Vec<String> {
    modes.iter().map(|mode| mode.to_string()).collect()
}

/// Spawn a task folding a source's status events into its table
///
/// Runs until the source is dropped or the registration is removed (the
/// handle is aborted on removal).
pub(super) fn spawn_source_watcher(
    table: Table,
    source: &VideoSource,
) -> JoinHandle<()> {
    let name = source.name().to_string();
    let mut events = source.subscribe_events();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SourceEvent::Connected) => table.put_bool("connected", true),
                Ok(SourceEvent::Disconnected) => table.put_bool("connected", false),
                Ok(SourceEvent::ModeChanged(mode)) => {
                    table.put_text("mode", mode.to_string());
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        source = %name,
                        skipped = skipped,
                        "Status watcher lagged"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!(source = %name, "Source dropped, watcher exiting");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_source_keys() {
        let table = Table::root("/CameraPublisher").subtable("cam");
        let source = VideoSource::usb_index("cam", 0);

        publish_source(&table, &source);

        assert_eq!(table.get_text("source").as_deref(), Some("usb:0"));
        assert_eq!(table.get_bool("connected"), Some(false));
        assert_eq!(
            table.get_text("mode").as_deref(),
            Some("640x480 MJPEG 30 fps")
        );
        assert_eq!(table.get_text_array("modes").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_watcher_tracks_events() {
        let table = Table::root("/CameraPublisher").subtable("cam");
        let source = VideoSource::usb_index("cam", 0);
        let watcher = spawn_source_watcher(table.clone(), &source);

        source.set_connected(true);
        source.set_resolution(320, 240);

        // Give the watcher task a chance to run
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(table.get_bool("connected"), Some(true));
        assert_eq!(
            table.get_text("mode").as_deref(),
            Some("320x240 MJPEG 30 fps")
        );

        // Disconnects flow through the same way
        source.set_connected(false);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(table.get_bool("connected"), Some(false));

        watcher.abort();
    }
}
