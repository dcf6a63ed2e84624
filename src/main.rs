// Main entry point - Wiring and run loop
use std::sync::Arc;

use bearing_monitor::application::job_server::JobServer;
use bearing_monitor::application::telemetry_consumer::TelemetryConsumer;
use bearing_monitor::infrastructure::config::load_monitor_config;
use bearing_monitor::infrastructure::http_job_server::HttpJobServer;
use bearing_monitor::presentation::console::{summary, ConsoleRenderer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_monitor_config()?;

    // Create job server client (infrastructure layer)
    let server = Arc::new(HttpJobServer::new(
        &config.api.base_url,
        config.api.control_timeout(),
    ));

    // Bearing catalog, read once; a failure only leaves the list empty
    let bearings = match server.list_bearings().await {
        Ok(bearings) => bearings,
        Err(e) => {
            tracing::warn!("Failed to fetch bearings: {}", e);
            Vec::new()
        }
    };
    for bearing in &bearings {
        tracing::info!("Bearing available: {} ({})", bearing.label, bearing.value);
    }

    let Some(bearing) = config
        .monitor
        .bearing
        .clone()
        .or_else(|| bearings.first().map(|b| b.value.clone()))
    else {
        anyhow::bail!("No bearing configured and the catalog is empty");
    };

    // Create consumer (application layer)
    let consumer = TelemetryConsumer::new(server);
    let mut updates = consumer.subscribe();
    let mut renderer = ConsoleRenderer::new();

    println!("Monitoring {} via {}", bearing, config.api.base_url);
    consumer.start(&bearing).await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    loop {
        for line in renderer.render(&consumer.view()) {
            println!("{}", line);
        }
        if consumer.status().is_terminal() {
            break;
        }

        tokio::select! {
            changed = updates.changed() => changed?,
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                consumer.stop().await;
            }
        }
    }

    for line in summary(&consumer.view()) {
        println!("{}", line);
    }

    Ok(())
}
