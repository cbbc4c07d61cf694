//! Local processing pipeline demo
//!
//! Run with: cargo run --example vision_pipeline
//!
//! Grabs frames from the primary feed, "processes" them (inverts the
//! pixels), and republishes the result as its own served stream. A feeder
//! task stands in for the capture engine.

use std::time::Duration;

use bytes::Bytes;
use camhub::{CameraServer, Frame, PixelFormat};

#[tokio::main]
async fn main() -> camhub::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let server = CameraServer::new();

    let camera = server.start_automatic_capture().await;
    camera.set_resolution(160, 120);

    let mut sink = server.get_video().await?;
    let annotated = server.put_video("Annotated", 160, 120).await;

    // Stand-in for the capture engine: feed grayscale test frames
    let feeder = camera.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(33));
        for shade in (0u8..=255).cycle() {
            ticker.tick().await;
            let frame = Frame::new(
                Bytes::from(vec![shade; 160 * 120]),
                160,
                120,
                PixelFormat::Gray,
            );
            feeder.put_frame(frame);
        }
    });

    for _ in 0..90 {
        let frame = sink.grab_frame_timeout(Duration::from_secs(1)).await?;

        let inverted: Vec<u8> = frame.data.iter().map(|&b| 255 - b).collect();
        annotated.put_frame(Frame::new(
            Bytes::from(inverted),
            frame.width,
            frame.height,
            frame.pixel_format,
        ));
    }

    let stats = camera.stats();
    println!(
        "camera delivered {} frames ({:.1} fps, {} bps)",
        stats.frames,
        stats.fps(),
        stats.bitrate()
    );

    Ok(())
}
