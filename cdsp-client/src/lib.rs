pub mod client;
pub mod device;
pub mod error;
#[cfg(feature = "test-utils")]
pub mod mock;
pub mod state;

pub use client::CamillaClient;
pub use device::{Device, Refresh};
pub use error::ApiError;
pub use state::{PlayerState, Snapshot};

/// User-Agent string used for all HTTP requests.
static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
