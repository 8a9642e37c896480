use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] Box<reqwest::Error>),
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: Box<reqwest::Error>,
    },
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed {
        endpoint: &'static str,
        reason: String,
    },
    #[error("requested profile {requested:?}, but device reports {active:?} as active")]
    ProfileMismatch {
        requested: String,
        active: Option<String>,
    },
}

impl ApiError {
    pub(crate) fn request(endpoint: &'static str, err: reqwest::Error) -> Self {
        ApiError::Request {
            endpoint,
            source: Box::new(err),
        }
    }

    pub(crate) fn malformed(endpoint: &'static str, reason: impl ToString) -> Self {
        ApiError::Malformed {
            endpoint,
            reason: reason.to_string(),
        }
    }

    /// Whether the request ran into the client's timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Request { source, .. } if source.is_timeout())
    }

    /// Endpoint the failing request was issued against, if any.
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            ApiError::Request { endpoint, .. } | ApiError::Malformed { endpoint, .. } => {
                Some(endpoint)
            }
            ApiError::Client(_) | ApiError::ProfileMismatch { .. } => None,
        }
    }
}
