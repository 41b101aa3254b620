//! Error types for the retrieval pipeline
//!
//! Two layers: [`VaultError`] is the crate error carrying context for `?`
//! propagation between stages, and [`ErrorKind`] is the flat, serializable
//! taxonomy reported to the caller inside a
//! [`DownloadResult`](crate::fetch::pipeline::DownloadResult).
//!
//! Propagation policy: per-frame decryption failures and per-candidate fetch
//! failures are recovered locally and never reach this layer; only candidate
//! exhaustion, a mid-body fetch failure, a sink I/O failure, or the final
//! size validation surface as a terminal error kind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, VaultError>;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum VaultError {
    /// The catalog collaborator could not resolve the track
    #[error("track metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// The request token fell back to its human-readable form
    #[error("request token degraded to fallback form")]
    TokenEncodingDegraded,

    /// Every candidate endpoint failed before yielding a body
    #[error("all {0} candidate endpoints exhausted")]
    AllEndpointsExhausted(usize),

    /// The in-flight request exceeded the configured timeout
    #[error("fetch timed out")]
    FetchTimeout,

    /// Connection or body-read failure
    #[error("transport failure: {0}")]
    FetchTransport(String),

    /// The remote answered with a non-2xx status
    #[error("remote returned status {0}")]
    BadRemoteStatus(u16),

    /// The decrypted output did not reach the minimum viable size
    #[error("output of {got} bytes is below the {floor}-byte size floor")]
    TooSmallResult { got: u64, floor: u64 },

    /// Destination sink I/O failure
    #[error("sink I/O failure: {0}")]
    SinkIo(#[from] std::io::Error),
}

impl VaultError {
    /// Map onto the flat reporting taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MetadataUnavailable(_) => ErrorKind::MetadataUnavailable,
            Self::TokenEncodingDegraded => ErrorKind::TokenEncodingDegraded,
            Self::AllEndpointsExhausted(_) => ErrorKind::AllEndpointsExhausted,
            Self::FetchTimeout => ErrorKind::FetchTimeout,
            Self::FetchTransport(_) => ErrorKind::FetchTransport,
            Self::BadRemoteStatus(code) => ErrorKind::BadRemoteStatus(*code),
            Self::TooSmallResult { .. } => ErrorKind::TooSmallResult,
            Self::SinkIo(_) => ErrorKind::SinkIo,
        }
    }
}

impl From<reqwest::Error> for VaultError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VaultError::FetchTimeout
        } else {
            VaultError::FetchTransport(err.to_string())
        }
    }
}

/// Terminal failure classification reported to the route layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Catalog lookup failed or returned malformed metadata
    MetadataUnavailable,
    /// Download failed and the request token was a degraded fallback
    TokenEncodingDegraded,
    /// No candidate endpoint produced a response body
    AllEndpointsExhausted,
    /// Timed out mid-body
    FetchTimeout,
    /// Transport failure mid-body
    FetchTransport,
    /// Non-2xx status (carried for diagnostics; per-candidate occurrences
    /// are absorbed by advancing to the next candidate)
    BadRemoteStatus(u16),
    /// Output finished below the size floor
    TooSmallResult,
    /// Destination write or rename failed
    SinkIo,
}
