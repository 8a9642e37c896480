use crate::device::{Device, Refresh};
use crate::error::ApiError;
use crate::state::Snapshot;
use async_trait::async_trait;
use cdsp_protocol::api;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Command received by a [`MockDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetVolume(f64),
    SetMuted(bool),
    SelectProfile(String),
}

/// In-memory [`Device`] replaying scripted refresh outcomes.
///
/// Queued outcomes are returned first; once the queue is drained, every refresh completes with the
/// device's current snapshot. Successful commands are applied to that snapshot, so a later refresh
/// confirms them the way the real backend would.
#[derive(Debug, Default)]
pub struct MockDevice {
    snapshot: Mutex<Snapshot>,
    scripted: Mutex<VecDeque<Refresh>>,
    commands: Mutex<Vec<Command>>,
    refresh_count: AtomicUsize,
    fail_commands: AtomicBool,
}

impl MockDevice {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            ..Default::default()
        }
    }

    pub fn set_snapshot(&self, snapshot: Snapshot) {
        *self.snapshot.lock() = snapshot;
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.lock().clone()
    }

    /// Queues an outcome returned by the next refresh that finds no earlier queued outcome.
    pub fn push_refresh(&self, refresh: Refresh) {
        self.scripted.lock().push_back(refresh);
    }

    /// Makes every following command fail without touching the snapshot.
    pub fn fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_count.load(Ordering::SeqCst)
    }

    fn apply(
        &self,
        endpoint: &'static str,
        command: Command,
        update: impl FnOnce(&mut Snapshot),
    ) -> Result<(), ApiError> {
        self.commands.lock().push(command);
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(ApiError::malformed(endpoint, "scripted command failure"));
        }
        update(&mut *self.snapshot.lock());
        Ok(())
    }
}

#[async_trait]
impl Device for MockDevice {
    async fn refresh(&self) -> Refresh {
        self.refresh_count.fetch_add(1, Ordering::SeqCst);
        if let Some(refresh) = self.scripted.lock().pop_front() {
            return refresh;
        }
        Refresh::Complete(self.snapshot())
    }

    async fn set_volume(&self, volume_db: f64) -> Result<(), ApiError> {
        self.apply(
            api::SET_VOLUME_ENDPOINT,
            Command::SetVolume(volume_db),
            |snapshot| snapshot.volume_db = volume_db,
        )
    }

    async fn set_muted(&self, muted: bool) -> Result<(), ApiError> {
        self.apply(
            api::SET_MUTE_ENDPOINT,
            Command::SetMuted(muted),
            |snapshot| snapshot.muted = muted,
        )
    }

    async fn select_profile(&self, name: &str) -> Result<(), ApiError> {
        self.apply(
            api::SET_ACTIVE_CONFIG_ENDPOINT,
            Command::SelectProfile(name.to_string()),
            |snapshot| snapshot.active_profile = Some(name.to_string()),
        )
    }
}
