//! Client for the station status endpoint

use std::time::Duration;

use anyhow::{bail, ensure, Context as _};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;


/// Title shown when the station reports itself offline.
pub const OFFLINE_TITLE: &str = "Offline";
/// Title shown when the status could not be fetched or decoded.
pub const ERROR_TITLE: &str = "Error";
/// Title shown when the station is on air but reports no track.
pub const NO_TRACK_TITLE: &str = "No track info";

/// Status payload as returned by the station endpoint.
///
/// Only the fields needed to derive a [`SongInfo`] are decoded, anything else is ignored.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RemoteStatus {
    pub status: String,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub current_track: Option<CurrentTrack>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CurrentTrack {
    pub title: String,
}

impl RemoteStatus {
    #[must_use]
    pub fn source_type(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.kind.as_str())
    }

    #[must_use]
    pub fn track_title(&self) -> Option<&str> {
        self.current_track.as_ref().map(|t| t.title.as_str())
    }
}

/// Normalized "now playing" snapshot of the station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongInfo {
    /// Track title or one of the placeholder titles. Never empty.
    pub title: String,
    /// Whether the station is broadcasting a live source.
    pub is_live: bool,
}

impl SongInfo {
    pub fn new(title: impl Into<String>, is_live: bool) -> Self {
        Self {
            title: title.into(),
            is_live,
        }
    }

    #[must_use]
    pub fn offline() -> Self {
        Self::new(OFFLINE_TITLE, false)
    }

    #[must_use]
    pub fn error() -> Self {
        Self::new(ERROR_TITLE, false)
    }
}

impl From<RemoteStatus> for SongInfo {
    fn from(status: RemoteStatus) -> Self {
        if status.status == "offline" {
            return Self::offline();
        }
        let is_live = status.source_type() == Some("live");
        let title = status
            .track_title()
            .filter(|t| !t.is_empty())
            .unwrap_or(NO_TRACK_TITLE);
        Self::new(title, is_live)
    }
}

/// Ways a single status round trip can fail.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to reach station: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Station responded with {0}")]
    Protocol(StatusCode),
    #[error("Malformed station status: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Fetches the status of one fixed station.
#[derive(Debug, Clone)]
pub struct StatusFetcher {
    client: Client,
    url: Url,
}

impl StatusFetcher {
    /// Build a fetcher for `<base_url>/stations/<station_id>/status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting URL is not a valid http(s) URL, or if the
    /// HTTP client cannot be constructed.
    pub fn new(base_url: &str, station_id: &str, timeout: Duration) -> anyhow::Result<Self> {
        ensure!(
            !station_id.is_empty() && !station_id.contains(['/', '?', '#']),
            "Invalid station id {station_id:?}"
        );
        let raw = format!(
            "{}/stations/{station_id}/status",
            base_url.trim_end_matches('/')
        );
        let url = Url::parse(&raw).with_context(|| format!("Invalid station URL {raw:?}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Unsupported URL scheme {:?} in {url}", url.scheme());
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, url })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Perform one round trip and decode the raw payload.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, on any status other than `200 OK`, or
    /// if the body is not a valid status document.
    pub async fn fetch_status(&self) -> Result<RemoteStatus, FetchError> {
        let response = self.client.get(self.url.clone()).send().await?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::Protocol(response.status()));
        }
        let body = response.bytes().await?;
        let status = serde_json::from_slice(&body)?;
        tracing::debug!(?status, "Station status received");
        Ok(status)
    }

    /// Fetch the current [`SongInfo`]. Failures are logged and reported as [`SongInfo::error`].
    pub async fn fetch(&self) -> SongInfo {
        match self.fetch_status().await {
            Ok(status) => status.into(),
            Err(e) => {
                tracing::warn!(url = %self.url, %e, "Failed to fetch station status");
                SongInfo::error()
            }
        }
    }
}
