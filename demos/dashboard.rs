//! Dashboard publication demo
//!
//! Run with: cargo run --example dashboard
//!
//! Registers two cameras, binds an extra stream server, and prints every
//! telemetry write a dashboard transport would forward. Simulated connection
//! flaps show the per-source watcher folding status events into the table.

use std::time::Duration;

use camhub::{CameraServer, HubConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = HubConfig::default().address("10.0.0.2");
    let server = CameraServer::with_config(config);

    // Print every telemetry write, the way a wire bridge would consume them
    let mut updates = server.publish_table().watch();
    tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            println!("{} [{}] = {}", update.path, update.key, update.value);
        }
    });

    let front = server.start_automatic_capture_named("Front Camera", 0).await;
    let back = server
        .start_automatic_capture_path("Back Camera", "/dev/video1")
        .await;

    // Serve the front camera on a second port as well
    let extra = server.add_server("serve_Front Camera (alt)").await;
    println!("extra server on port {}", extra.port());
    server
        .set_server_source("serve_Front Camera (alt)", Some(&front))
        .await
        .unwrap();

    // Simulate the capture engine reporting device state
    front.set_connected(true);
    back.set_connected(true);
    front.set_resolution(320, 240);

    tokio::time::sleep(Duration::from_millis(100)).await;

    back.set_connected(false);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stats = server.stats().await;
    println!(
        "registered: {} sources, {} stream servers, next port {}",
        stats.sources, stats.stream_servers, stats.next_port
    );
}
