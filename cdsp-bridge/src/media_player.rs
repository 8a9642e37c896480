//! Media player entity exposed to the host.
//!
//! Commands are applied optimistically: the entity patches its view right away and marks it
//! unconfirmed, then sends the command to the device. The next snapshot published by the
//! [`Coordinator`] replaces the patch wholesale, whether or not the command took effect.

use crate::config::{DEVICE_MANUFACTURER, DEVICE_MODEL, DEVICE_NAME};
use crate::coordinator::Coordinator;
use crate::error::BridgeError;
use crate::volume::VolumeConverter;
use cdsp_client::{ApiError, Device, PlayerState, Snapshot};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, instrument};
use uuid::Uuid;

/// Derives a stable 16 hex digit identifier from the device URL.
pub fn device_identifier(url: &str) -> String {
    let mut identifier = Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_bytes())
        .simple()
        .to_string();
    identifier.truncate(16);
    identifier
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: &'static str,
    pub manufacturer: &'static str,
    pub model: &'static str,
}

/// State of the entity as presented to the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaPlayerView {
    pub available: bool,
    pub state: PlayerState,
    pub volume_level: f64,
    pub is_volume_muted: bool,
    pub source: Option<String>,
    pub source_list: Vec<String>,
    pub volume_step: f64,
    /// Raw attenuation, exposed as an extra attribute.
    pub volume_db: f64,
    pub capture_rate: u32,
    /// Set while a local change is shown that no refresh has confirmed yet.
    pub unconfirmed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Patch {
    volume_db: Option<f64>,
    muted: Option<bool>,
    source: Option<String>,
}

impl Patch {
    fn merge(&mut self, other: Patch) {
        self.volume_db = other.volume_db.or(self.volume_db);
        self.muted = other.muted.or(self.muted);
        self.source = other.source.or(self.source.take());
    }

    fn apply(&self, snapshot: &mut Snapshot) {
        if let Some(volume_db) = self.volume_db {
            snapshot.volume_db = volume_db;
        }
        if let Some(muted) = self.muted {
            snapshot.muted = muted;
        }
        if let Some(source) = &self.source {
            snapshot.active_profile = Some(source.clone());
        }
    }
}

/// Patch made against the snapshot of a given generation.
#[derive(Debug)]
struct Tentative {
    generation: u64,
    patch: Patch,
}

pub struct MediaPlayer {
    unique_id: String,
    device_info: DeviceInfo,
    device: Arc<dyn Device>,
    coordinator: Arc<Coordinator>,
    converter: RwLock<VolumeConverter>,
    tentative: Mutex<Option<Tentative>>,
    view_tx: watch::Sender<MediaPlayerView>,
}

impl MediaPlayer {
    pub fn new(
        url: &str,
        device: Arc<dyn Device>,
        coordinator: Arc<Coordinator>,
        converter: VolumeConverter,
    ) -> Self {
        let identifier = device_identifier(url);
        let (view_tx, _) = watch::channel(MediaPlayerView::default());
        let media_player = Self {
            unique_id: identifier.clone(),
            device_info: DeviceInfo {
                identifier,
                name: DEVICE_NAME,
                manufacturer: DEVICE_MANUFACTURER,
                model: DEVICE_MODEL,
            },
            device,
            coordinator,
            converter: RwLock::new(converter),
            tentative: Mutex::new(None),
            view_tx,
        };
        media_player.publish_view();
        media_player
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    pub fn converter(&self) -> VolumeConverter {
        *self.converter.read()
    }

    /// Swaps the volume converter after the volume options were edited.
    pub fn set_converter(&self, converter: VolumeConverter) {
        *self.converter.write() = converter;
        self.publish_view();
    }

    /// Receives every view published by this entity.
    pub fn subscribe(&self) -> watch::Receiver<MediaPlayerView> {
        self.view_tx.subscribe()
    }

    /// Current view: the latest published snapshot, with the pending local patch applied if no newer
    /// snapshot arrived since it was made.
    pub fn view(&self) -> MediaPlayerView {
        let published = self.coordinator.current();
        let mut snapshot = published.snapshot;

        let mut tentative = self.tentative.lock();
        if tentative
            .as_ref()
            .is_some_and(|pending| pending.generation != published.generation)
        {
            tracing::trace!(
                generation = published.generation,
                "Dropping local patch superseded by refresh"
            );
            *tentative = None;
        }
        let unconfirmed = match tentative.as_ref() {
            Some(pending) => {
                pending.patch.apply(&mut snapshot);
                true
            }
            None => false,
        };
        drop(tentative);

        let converter = self.converter.read();
        MediaPlayerView {
            available: snapshot.is_active(),
            state: snapshot.state,
            volume_level: converter.from_db(snapshot.volume_db),
            is_volume_muted: snapshot.muted,
            source: snapshot.active_profile,
            source_list: snapshot.available_profiles,
            volume_step: converter.step(),
            volume_db: snapshot.volume_db,
            capture_rate: snapshot.capture_rate,
            unconfirmed,
        }
    }

    fn publish_view(&self) {
        let view = self.view();
        self.view_tx.send_replace(view);
    }

    /// Republishes the view whenever the coordinator publishes a snapshot, until shutdown.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let media_player = self.clone();
        let mut data_rx = self.coordinator.subscribe();
        let mut shutdown_rx = self.coordinator.shutdown_signal();

        tokio::spawn(
            async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = shutdown_rx.changed() => {
                            tracing::trace!("Shutdown signalled, stopping media player updates");
                            break;
                        }
                        changed = data_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            media_player.publish_view();
                        }
                    }
                }
            }
            .instrument(tracing::Span::current()),
        )
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn set_volume_level(&self, level: f64) -> Result<(), BridgeError> {
        let volume_db = self.converter.read().to_db(level);
        self.command(
            Patch {
                volume_db: Some(volume_db),
                ..Default::default()
            },
            self.device.set_volume(volume_db),
        )
        .await
    }

    pub async fn volume_up(&self) -> Result<(), BridgeError> {
        self.step_volume(1.0).await
    }

    pub async fn volume_down(&self) -> Result<(), BridgeError> {
        self.step_volume(-1.0).await
    }

    async fn step_volume(&self, direction: f64) -> Result<(), BridgeError> {
        let step = self.converter.read().step();
        if step <= 0.0 {
            tracing::debug!("Volume step disabled, ignoring step request");
            return Ok(());
        }
        let level = (self.view().volume_level + direction * step).clamp(0.0, 1.0);
        self.set_volume_level(level).await
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn mute_volume(&self, muted: bool) -> Result<(), BridgeError> {
        self.command(
            Patch {
                muted: Some(muted),
                ..Default::default()
            },
            self.device.set_muted(muted),
        )
        .await
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn select_source(&self, source: &str) -> Result<(), BridgeError> {
        self.command(
            Patch {
                source: Some(source.to_string()),
                ..Default::default()
            },
            self.device.select_profile(source),
        )
        .await
    }

    async fn command(
        &self,
        patch: Patch,
        request: impl Future<Output = Result<(), ApiError>>,
    ) -> Result<(), BridgeError> {
        if self.coordinator.is_shutting_down() {
            tracing::debug!("Shutting down, rejecting command");
            return Err(BridgeError::ShuttingDown);
        }

        self.apply_tentative(patch);
        let result = request.await;
        if let Err(err) = &result {
            tracing::warn!(?err, "Command failed, local state stays until the next refresh");
        }
        self.coordinator.request_refresh();
        result.map_err(Into::into)
    }

    fn apply_tentative(&self, patch: Patch) {
        let generation = self.coordinator.current().generation;
        {
            let mut tentative = self.tentative.lock();
            if let Some(pending) = tentative
                .as_mut()
                .filter(|pending| pending.generation == generation)
            {
                pending.patch.merge(patch);
            } else {
                *tentative = Some(Tentative { generation, patch });
            }
        }
        self.publish_view();
    }
}
