use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Normalized player state, as derived from the `cdsp_status` reported by the CamillaDSP backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayerState {
    /// Backend unreachable or reporting a status we do not know.
    #[default]
    Off,
    /// `INACTIVE`: the DSP process is running but not processing.
    Standby,
    /// `STALLED`: processing, but no input data is arriving.
    Idle,
    /// `STARTING`
    On,
    /// `RUNNING`
    Playing,
    /// `PAUSED`: processing paused because the input is silent.
    Paused,
}

impl PlayerState {
    /// Maps an optional raw status, treating a missing one as [`PlayerState::Off`].
    pub fn from_status(status: Option<&str>) -> Self {
        status.map(PlayerState::from).unwrap_or_default()
    }

    pub fn is_off(self) -> bool {
        self == PlayerState::Off
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerState::Off => "off",
            PlayerState::Standby => "standby",
            PlayerState::Idle => "idle",
            PlayerState::On => "on",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
        }
    }
}

impl FromStr for PlayerState {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INACTIVE" => Ok(PlayerState::Standby),
            "PAUSED" => Ok(PlayerState::Paused),
            "RUNNING" => Ok(PlayerState::Playing),
            "STALLED" => Ok(PlayerState::Idle),
            "STARTING" => Ok(PlayerState::On),
            _ => Ok(PlayerState::Off),
        }
    }
}

impl From<&str> for PlayerState {
    fn from(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl Display for PlayerState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time read of the device, produced by one refresh cycle.
///
/// An [`PlayerState::Off`] snapshot always carries defaults for every other field, the follow-up
/// requests are skipped entirely in that case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub state: PlayerState,
    /// Attenuation in dB, `0.0` being full scale.
    pub volume_db: f64,
    pub muted: bool,
    /// Name of the loaded config file, if the backend knows one.
    pub active_profile: Option<String>,
    /// Stored config file names in the order reported by the backend.
    pub available_profiles: Vec<String>,
    /// Capture sample rate in Hz, `0` when unknown.
    pub capture_rate: u32,
}

impl Snapshot {
    pub fn off() -> Self {
        Self::default()
    }

    /// A snapshot that only knows the player state, all active fields at their defaults.
    pub fn with_state(state: PlayerState) -> Self {
        Self {
            state,
            ..Default::default()
        }
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_off()
    }

    /// Replaces all active fields with the ones from `other`, keeping this snapshot's state.
    pub fn with_active_fields_of(self, other: &Snapshot) -> Self {
        Self {
            state: self.state,
            ..other.clone()
        }
    }
}
