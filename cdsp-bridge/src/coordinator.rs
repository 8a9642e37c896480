use cdsp_client::{Device, Refresh, Snapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::instrument;

/// Snapshot as pushed to subscribers. The generation increases with every published refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishedSnapshot {
    pub generation: u64,
    pub snapshot: Snapshot,
}

/// Drives the polling cycle of a single device and publishes the resulting snapshots.
pub struct Coordinator {
    device: Arc<dyn Device>,
    scan_interval: Duration,
    /// Last snapshot read completely from the device. Held for the whole refresh, so only one
    /// refresh is ever in flight.
    confirmed: Mutex<Snapshot>,
    data_tx: watch::Sender<PublishedSnapshot>,
    refresh_requested: Notify,
    shutdown_rx: watch::Receiver<()>,
}

impl Coordinator {
    /// Creates a coordinator publishing `initial` until the first refresh, usually the snapshot read
    /// while validating the device.
    pub fn new(
        device: Arc<dyn Device>,
        initial: Snapshot,
        scan_interval: Duration,
        shutdown_rx: watch::Receiver<()>,
    ) -> Self {
        let (data_tx, _) = watch::channel(PublishedSnapshot {
            generation: 0,
            snapshot: initial.clone(),
        });
        Self {
            device,
            scan_interval,
            confirmed: Mutex::new(initial),
            data_tx,
            refresh_requested: Notify::new(),
            shutdown_rx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PublishedSnapshot> {
        self.data_tx.subscribe()
    }

    pub fn current(&self) -> PublishedSnapshot {
        self.data_tx.borrow().clone()
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<()> {
        self.shutdown_rx.clone()
    }

    /// Whether shutdown was signalled (or its sender is gone).
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_rx.has_changed().unwrap_or(true)
    }

    /// Asks the run loop for an immediate refresh, e.g. after a command was sent.
    pub fn request_refresh(&self) {
        self.refresh_requested.notify_one();
    }

    /// Runs one refresh cycle, publishes and returns the resulting snapshot.
    ///
    /// A degraded cycle keeps the active fields of the last confirmed snapshot, an unreachable device
    /// is published as off.
    #[instrument(level = "debug", skip(self))]
    pub async fn refresh_now(&self) -> Snapshot {
        let mut confirmed = self.confirmed.lock().await;
        if self.is_shutting_down() {
            tracing::debug!("Shutting down, skipping refresh");
            return self.current().snapshot;
        }

        let snapshot = match self.device.refresh().await {
            Refresh::Complete(snapshot) => {
                *confirmed = snapshot.clone();
                snapshot
            }
            Refresh::Degraded { snapshot, error } => {
                tracing::warn!(?error, state = %snapshot.state, "Refresh degraded, keeping last confirmed device values");
                if confirmed.is_active() {
                    snapshot.with_active_fields_of(&confirmed)
                } else {
                    snapshot
                }
            }
            Refresh::Unreachable(error) => {
                if error.is_timeout() {
                    tracing::warn!(?error, "CamillaDSP timed out, marking unavailable");
                } else {
                    tracing::warn!(?error, "CamillaDSP unreachable, marking unavailable");
                }
                *confirmed = Snapshot::off();
                Snapshot::off()
            }
        };

        self.publish(snapshot.clone());
        snapshot
    }

    fn publish(&self, snapshot: Snapshot) {
        self.data_tx.send_modify(|published| {
            published.generation += 1;
            published.snapshot = snapshot;
            tracing::trace!(generation = published.generation, "Published snapshot");
        });
    }

    /// Polls the device every scan interval and on request until shutdown is signalled.
    ///
    /// The first scheduled refresh happens one interval after start, the initial snapshot is already
    /// published at construction.
    #[instrument(level = "debug", skip(self), fields(scan_interval = ?self.scan_interval))]
    pub async fn run(&self) {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut interval =
            tokio::time::interval_at(Instant::now() + self.scan_interval, self.scan_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!("Coordinator started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    tracing::trace!("Shutdown signalled, stopping coordinator");
                    break;
                }
                _ = interval.tick() => {}
                _ = self.refresh_requested.notified() => {
                    tracing::trace!("Refresh requested");
                    interval.reset();
                }
            }

            if self.is_shutting_down() {
                break;
            }
            self.refresh_now().await;
        }
        tracing::debug!("Coordinator stopped");
    }
}
