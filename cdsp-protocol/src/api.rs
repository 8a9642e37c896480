use serde::{Deserialize, Serialize};
use std::num::ParseFloatError;

/// Processing status, see [`Status`].
pub const STATUS_ENDPOINT: &str = "/api/status";
/// Current volume in dB as plain text.
pub const GET_VOLUME_ENDPOINT: &str = "/api/getparam/volume";
/// Accepts a new volume in dB as plain text.
pub const SET_VOLUME_ENDPOINT: &str = "/api/setparam/volume";
/// Current mute flag as plain text (`True`/`False`).
pub const GET_MUTE_ENDPOINT: &str = "/api/getparam/mute";
/// Accepts a new mute flag as plain text (`True`/`False`).
pub const SET_MUTE_ENDPOINT: &str = "/api/setparam/mute";
/// Name of the currently loaded config file, see [`ActiveConfigFile`].
pub const GET_ACTIVE_CONFIG_ENDPOINT: &str = "/api/getactiveconfigfile";
/// Loads a stored config file, see [`SetActiveConfigFile`].
pub const SET_ACTIVE_CONFIG_ENDPOINT: &str = "/api/setactiveconfigfile";
/// All config files known to the backend, see [`StoredConfig`].
pub const STORED_CONFIGS_ENDPOINT: &str = "/api/storedconfigs";

const BOOL_TRUE: &str = "True";
const BOOL_FALSE: &str = "False";

/// Response body of [`STATUS_ENDPOINT`].
///
/// The backend reports a lot more (buffer levels, clipping counters, ...); only the fields the bridge
/// consumes are decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Status {
    /// Processing state, e.g. `RUNNING` or `INACTIVE`. Missing when the DSP process is not reachable
    /// from the backend.
    #[serde(default)]
    pub cdsp_status: Option<String>,
    /// Capture sample rate, only meaningful while processing.
    #[serde(default)]
    pub capturerate: Option<u32>,
}

/// Response body of [`GET_ACTIVE_CONFIG_ENDPOINT`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ActiveConfigFile {
    #[serde(rename = "configFileName", default)]
    pub config_file_name: Option<String>,
}

/// Single entry of the [`STORED_CONFIGS_ENDPOINT`] response array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoredConfig {
    #[serde(default)]
    pub name: Option<String>,
}

/// Request body of [`SET_ACTIVE_CONFIG_ENDPOINT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetActiveConfigFile<'a> {
    pub name: &'a str,
}

/// Parses the plain-text body of [`GET_VOLUME_ENDPOINT`].
pub fn parse_volume(body: &str) -> Result<f64, ParseFloatError> {
    body.trim().parse()
}

/// Renders a volume for [`SET_VOLUME_ENDPOINT`].
pub fn format_volume(volume_db: f64) -> String {
    volume_db.to_string()
}

/// Parses the plain-text body of [`GET_MUTE_ENDPOINT`]. Anything but `True` counts as unmuted.
pub fn parse_mute(body: &str) -> bool {
    body.trim() == BOOL_TRUE
}

/// Renders a mute flag for [`SET_MUTE_ENDPOINT`].
pub fn format_mute(muted: bool) -> &'static str {
    if muted { BOOL_TRUE } else { BOOL_FALSE }
}

/// Extracts the profile names from a stored configs listing, keeping server order and skipping
/// entries without a name.
pub fn profile_names(configs: impl IntoIterator<Item = StoredConfig>) -> Vec<String> {
    configs.into_iter().filter_map(|config| config.name).collect()
}
