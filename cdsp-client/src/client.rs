//! HTTP client for the CamillaDSP backend API.
//!
//! # Examples
//!
//! ```rust
//! #[cfg(test)]
//! mod tests {
//!     use cdsp_client::{CamillaClient, PlayerState};
//!     use wiremock::matchers::{method, path};
//!     use wiremock::{Mock, MockServer, ResponseTemplate};
//!
//!     #[tokio::test]
//!     async fn refresh_inactive() -> anyhow::Result<()> {
//!         let server = MockServer::start().await;
//!         Mock::given(method("GET"))
//!             .and(path("/api/status"))
//!             .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
//!             .mount(&server)
//!             .await;
//!
//!         let client = CamillaClient::with_default_client(&server.uri())?;
//!         let snapshot = client.probe().await?;
//!
//!         assert_eq!(snapshot.state, PlayerState::Off);
//!         Ok(())
//!     }
//! }
//! ```

use crate::device::{Device, Refresh};
use crate::error::ApiError;
use crate::state::{PlayerState, Snapshot};
use async_trait::async_trait;
use cdsp_protocol::api;
use cdsp_protocol::{ActiveConfigFile, SetActiveConfigFile, Status, StoredConfig};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::instrument;

/// Default timeout for HTTP requests against the CamillaDSP backend.
/// Can be overwritten using [`CamillaClient::with_timeout`].
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Builds an HTTP client suitable for talking to the CamillaDSP backend.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ApiError> {
    reqwest::ClientBuilder::new()
        .user_agent(crate::APP_USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|err| ApiError::Client(Box::new(err)))
}

/// Client for a single CamillaDSP backend.
#[derive(Debug, Clone)]
pub struct CamillaClient {
    /// HTTP client used for all requests, usually shared with the rest of the application.
    client: reqwest::Client,
    /// Base URL of the backend without trailing slash, e.g. `http://dsp.local:5005`.
    base_url: String,
}

impl CamillaClient {
    /// Creates a new [`CamillaClient`] issuing its requests through the given HTTP client.
    ///
    /// The client's timeout applies to every request, see [`build_http_client`].
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates a new [`CamillaClient`] with its own HTTP client and the [`DEFAULT_HTTP_TIMEOUT`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cdsp_client::CamillaClient;
    ///
    /// let client = CamillaClient::with_default_client("http://localhost:5005/").unwrap();
    /// assert_eq!(client.base_url(), "http://localhost:5005");
    /// ```
    pub fn with_default_client(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self::new(base_url, build_http_client(DEFAULT_HTTP_TIMEOUT)?))
    }

    /// Replaces the HTTP client with one using a user-defined [`Duration`] timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ApiError> {
        self.client = build_http_client(timeout)?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Runs a full refresh cycle, failing on anything but a complete read.
    ///
    /// Used to validate a device before taking it into service: a backend that cannot answer every
    /// request of the cycle is treated as not reachable.
    #[instrument(level = "debug", skip(self), fields(base_url = %self.base_url), err)]
    pub async fn probe(&self) -> Result<Snapshot, ApiError> {
        self.refresh_cycle().await.into_result()
    }

    #[instrument(level = "debug", skip(self), fields(base_url = %self.base_url))]
    async fn refresh_cycle(&self) -> Refresh {
        let status = match self.fetch_status().await {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(?err, "CamillaDSP status request failed");
                return Refresh::Unreachable(err);
            }
        };

        let state = PlayerState::from_status(status.cdsp_status.as_deref());
        if state.is_off() {
            tracing::debug!(cdsp_status = ?status.cdsp_status, "CamillaDSP is off, skipping follow-up requests");
            return Refresh::Complete(Snapshot::off());
        }

        match self
            .fetch_active_fields(state, status.capturerate.unwrap_or_default())
            .await
        {
            Ok(snapshot) => {
                tracing::debug!(?snapshot, "Refreshed CamillaDSP snapshot");
                Refresh::Complete(snapshot)
            }
            Err(err) => {
                tracing::warn!(?err, %state, "CamillaDSP follow-up request failed, reporting state only");
                Refresh::Degraded {
                    snapshot: Snapshot::with_state(state),
                    error: err,
                }
            }
        }
    }

    async fn fetch_status(&self) -> Result<Status, ApiError> {
        self.get_json(api::STATUS_ENDPOINT).await
    }

    async fn fetch_active_fields(
        &self,
        state: PlayerState,
        capture_rate: u32,
    ) -> Result<Snapshot, ApiError> {
        let volume_body = self.get_text(api::GET_VOLUME_ENDPOINT).await?;
        let volume_db = api::parse_volume(&volume_body)
            .map_err(|err| ApiError::malformed(api::GET_VOLUME_ENDPOINT, err))?;

        let muted = api::parse_mute(&self.get_text(api::GET_MUTE_ENDPOINT).await?);
        let active_profile = self.fetch_active_profile().await?;

        let stored: Vec<StoredConfig> = self.get_json(api::STORED_CONFIGS_ENDPOINT).await?;
        let available_profiles = api::profile_names(stored);

        Ok(Snapshot {
            state,
            volume_db,
            muted,
            active_profile,
            available_profiles,
            capture_rate,
        })
    }

    async fn fetch_active_profile(&self) -> Result<Option<String>, ApiError> {
        let active: ActiveConfigFile = self.get_json(api::GET_ACTIVE_CONFIG_ENDPOINT).await?;
        Ok(active.config_file_name.filter(|name| !name.is_empty()))
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    /// Performs a GET request and returns the response body as text.
    async fn get_text(&self, endpoint: &'static str) -> Result<String, ApiError> {
        tracing::trace!(endpoint, "Performing HTTP request");
        let response = self
            .client
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(|err| ApiError::request(endpoint, err))?
            .error_for_status()
            .map_err(|err| ApiError::request(endpoint, err))?;

        tracing::trace!(endpoint, content_length = ?response.content_length(), "Reading response body");
        response
            .text()
            .await
            .map_err(|err| ApiError::request(endpoint, err))
    }

    /// Performs a GET request and decodes the JSON response body.
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, ApiError> {
        let body = self.get_text(endpoint).await?;
        serde_json::from_str(&body).map_err(|err| ApiError::malformed(endpoint, err))
    }

    async fn post_text(&self, endpoint: &'static str, body: String) -> Result<(), ApiError> {
        tracing::trace!(endpoint, ?body, "Performing HTTP request");
        self.client
            .post(self.url(endpoint))
            .body(body)
            .send()
            .await
            .map_err(|err| ApiError::request(endpoint, err))?
            .error_for_status()
            .map_err(|err| ApiError::request(endpoint, err))?;
        Ok(())
    }
}

#[async_trait]
impl Device for CamillaClient {
    async fn refresh(&self) -> Refresh {
        self.refresh_cycle().await
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn set_volume(&self, volume_db: f64) -> Result<(), ApiError> {
        self.post_text(api::SET_VOLUME_ENDPOINT, api::format_volume(volume_db))
            .await
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn set_muted(&self, muted: bool) -> Result<(), ApiError> {
        self.post_text(api::SET_MUTE_ENDPOINT, api::format_mute(muted).to_string())
            .await
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn select_profile(&self, name: &str) -> Result<(), ApiError> {
        let endpoint = api::SET_ACTIVE_CONFIG_ENDPOINT;
        tracing::trace!(endpoint, "Performing HTTP request");
        self.client
            .post(self.url(endpoint))
            .json(&SetActiveConfigFile { name })
            .send()
            .await
            .map_err(|err| ApiError::request(endpoint, err))?
            .error_for_status()
            .map_err(|err| ApiError::request(endpoint, err))?;

        let active = self.fetch_active_profile().await?;
        if active.as_deref() != Some(name) {
            tracing::warn!(requested = name, ?active, "Profile switch not reflected by backend");
            return Err(ApiError::ProfileMismatch {
                requested: name.to_string(),
                active,
            });
        }

        tracing::debug!(profile = name, "Profile activated");
        Ok(())
    }
}
