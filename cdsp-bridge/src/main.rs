use anyhow::Context;
use cdsp_bridge::bridge::Bridge;
use cdsp_bridge::config::AppConfig;
use cdsp_bridge::media_player::MediaPlayerView;
use cdsp_client::client::build_http_client;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,cdsp_client=info", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::parse().context("Failed to load configuration")?;
    let http =
        build_http_client(config.device.timeout()).context("Failed to create HTTP client")?;
    let bridge = Bridge::setup(config, http)
        .await
        .context("Failed to set up CamillaDSP bridge")?;

    tracing::info!(
        unique_id = bridge.media_player().unique_id(),
        device_info = ?bridge.media_player().device_info(),
        "Media player ready"
    );

    let tasks = bridge.start();
    let view_task = tokio::spawn(log_views(bridge.media_player().subscribe()));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received, stopping bridge");

    bridge.shutdown();
    tasks.join().await?;
    view_task.abort();

    Ok(())
}

async fn log_views(mut view_rx: watch::Receiver<MediaPlayerView>) {
    while view_rx.changed().await.is_ok() {
        let view = view_rx.borrow_and_update().clone();
        tracing::info!(
            available = view.available,
            state = %view.state,
            volume_level = view.volume_level,
            volume_db = view.volume_db,
            muted = view.is_volume_muted,
            source = ?view.source,
            capture_rate = view.capture_rate,
            unconfirmed = view.unconfirmed,
            "Media player state"
        );
    }
}
