use cdsp_client::ApiError;
use thiserror::Error;

/// Invalid user configuration, reported when the configuration is loaded or edited.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid device URL {url:?}: {reason}")]
    InvalidHost { url: String, reason: String },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot connect to CamillaDSP at {url}: {source}")]
    CannotConnect {
        url: String,
        #[source]
        source: ApiError,
    },
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("bridge is shutting down, command rejected")]
    ShuttingDown,
}
