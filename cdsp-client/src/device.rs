use crate::error::ApiError;
use crate::state::Snapshot;
use async_trait::async_trait;

/// Outcome of a single refresh cycle.
#[derive(Debug)]
pub enum Refresh {
    /// Every request of the cycle succeeded.
    Complete(Snapshot),
    /// The status was read, but one of the follow-up requests failed. The snapshot carries the
    /// reported state and defaults for everything else.
    Degraded { snapshot: Snapshot, error: ApiError },
    /// The status request itself failed, the device is considered unreachable.
    Unreachable(ApiError),
}

impl Refresh {
    pub fn is_complete(&self) -> bool {
        matches!(self, Refresh::Complete(_))
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Refresh::Complete(snapshot) | Refresh::Degraded { snapshot, .. } => Some(snapshot),
            Refresh::Unreachable(_) => None,
        }
    }

    /// Strict view of the outcome: anything but [`Refresh::Complete`] is an error.
    pub fn into_result(self) -> Result<Snapshot, ApiError> {
        match self {
            Refresh::Complete(snapshot) => Ok(snapshot),
            Refresh::Degraded { error, .. } | Refresh::Unreachable(error) => Err(error),
        }
    }
}

/// Control surface of a CamillaDSP instance.
#[async_trait]
pub trait Device: Send + Sync {
    async fn refresh(&self) -> Refresh;
    async fn set_volume(&self, volume_db: f64) -> Result<(), ApiError>;
    async fn set_muted(&self, muted: bool) -> Result<(), ApiError>;
    /// Loads the named stored config, succeeding only once the backend reports it as active.
    async fn select_profile(&self, name: &str) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PlayerState;

    #[test]
    fn into_result() {
        let complete = Refresh::Complete(Snapshot::with_state(PlayerState::Playing));
        assert!(complete.is_complete());
        assert_eq!(complete.into_result().unwrap().state, PlayerState::Playing);

        let degraded = Refresh::Degraded {
            snapshot: Snapshot::with_state(PlayerState::Playing),
            error: ApiError::malformed("/api/getparam/volume", "not a number"),
        };
        assert_eq!(degraded.snapshot().unwrap().state, PlayerState::Playing);
        assert!(degraded.into_result().is_err());

        let unreachable = Refresh::Unreachable(ApiError::malformed("/api/status", "eof"));
        assert!(unreachable.snapshot().is_none());
        assert!(matches!(
            unreachable.into_result(),
            Err(ApiError::Malformed { endpoint: "/api/status", .. })
        ));
    }
}
