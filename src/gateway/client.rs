//! HTTP client for the catalog metadata collaborator

use std::time::Duration;

use tracing::debug;
use url::Url;

use super::track::TrackMetadata;
use crate::error::{Result, VaultError};

/// Thin typed client for the catalog lookup API.
///
/// Carries its own timeout so a slow collaborator cannot stall the whole
/// pipeline; every failure mode maps to `MetadataUnavailable`.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base: Url,
}

impl GatewayClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| VaultError::MetadataUnavailable(format!("invalid catalog base URL: {e}")))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    /// Resolve one track id to its catalog metadata.
    pub async fn lookup_track(&self, track_id: &str) -> Result<TrackMetadata> {
        let url = self
            .base
            .join(&format!("tracks/{track_id}"))
            .map_err(|e| VaultError::MetadataUnavailable(format!("bad track id {track_id}: {e}")))?;

        debug!(%track_id, "looking up track metadata");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| VaultError::MetadataUnavailable(format!("catalog request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::MetadataUnavailable(format!(
                "catalog returned status {status} for track {track_id}"
            )));
        }

        response
            .json::<TrackMetadata>()
            .await
            .map_err(|e| VaultError::MetadataUnavailable(format!("malformed catalog response: {e}")))
    }
}
