use crate::config::{AppConfig, VolumeConfig};
use crate::coordinator::Coordinator;
use crate::error::{ConfigError, SetupError};
use crate::media_player::MediaPlayer;
use crate::volume::VolumeConverter;
use anyhow::Context;
use cdsp_client::{CamillaClient, Device};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, instrument};

/// A validated device with its coordinator and media player entity.
pub struct Bridge {
    config: AppConfig,
    coordinator: Arc<Coordinator>,
    media_player: Arc<MediaPlayer>,
    shutdown_tx: watch::Sender<()>,
}

impl Bridge {
    /// Validates the configuration and the device behind it, issuing all requests through `http`.
    ///
    /// Fails with [`SetupError::CannotConnect`] unless the device answers a complete refresh cycle.
    pub async fn setup(config: AppConfig, http: reqwest::Client) -> Result<Self, SetupError> {
        let client = CamillaClient::new(&config.device.url, http);
        Self::with_device(config, Arc::new(client)).await
    }

    #[instrument(level = "info", skip_all, fields(url = %config.device.url), err)]
    pub async fn with_device(
        config: AppConfig,
        device: Arc<dyn Device>,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        let converter = VolumeConverter::new(config.volume.range()?);

        tracing::debug!("Validating CamillaDSP connection");
        let snapshot = device
            .refresh()
            .await
            .into_result()
            .map_err(|source| SetupError::CannotConnect {
                url: config.device.url.clone(),
                source,
            })?;
        tracing::info!(state = %snapshot.state, "Connected to CamillaDSP");

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let coordinator = Arc::new(Coordinator::new(
            device.clone(),
            snapshot,
            config.polling.scan_interval(),
            shutdown_rx,
        ));
        let media_player = Arc::new(MediaPlayer::new(
            &config.device.url,
            device,
            coordinator.clone(),
            converter,
        ));

        Ok(Self {
            config,
            coordinator,
            media_player,
            shutdown_tx,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn media_player(&self) -> &Arc<MediaPlayer> {
        &self.media_player
    }

    /// Applies edited volume options. Invalid options are rejected and leave the current ones in place.
    pub fn reconfigure_volume(&mut self, volume: VolumeConfig) -> Result<(), ConfigError> {
        let converter = VolumeConverter::new(volume.range()?);
        tracing::info!(?volume, step = converter.step(), "Volume options updated");
        self.media_player.set_converter(converter);
        self.config.volume = volume;
        Ok(())
    }

    /// Spawns the polling loop and the media player update task.
    pub fn start(&self) -> BridgeTasks {
        let coordinator = self.coordinator.clone();
        let coordinator_task = tokio::spawn(
            async move { coordinator.run().await }.instrument(tracing::Span::current()),
        );
        let media_player_task = self.media_player.spawn();

        BridgeTasks {
            coordinator_task,
            media_player_task,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        tracing::debug!("Bridge dropped, sending shutdown signal");
        self.shutdown();
    }
}

pub struct BridgeTasks {
    coordinator_task: JoinHandle<()>,
    media_player_task: JoinHandle<()>,
}

impl BridgeTasks {
    #[instrument(level = "trace", skip(self), err)]
    pub async fn join(self) -> anyhow::Result<()> {
        tracing::trace!("Waiting for bridge tasks to finish");
        self.coordinator_task
            .await
            .context("Failed to join coordinator task")?;
        self.media_player_task
            .await
            .context("Failed to join media player task")
    }
}
