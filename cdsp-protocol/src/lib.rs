//! Wire types of the CamillaDSP HTTP control API.
//!
//! The API mixes JSON and plain-text payloads: status, profile and stored config endpoints speak JSON,
//! while parameters (volume, mute) are read and written as bare text.

pub mod api;

pub use api::{ActiveConfigFile, SetActiveConfigFile, Status, StoredConfig};
