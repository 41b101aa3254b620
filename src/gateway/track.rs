//! Track metadata, quality tiers and the session credential

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// Quality tier requested for a stream.
///
/// Maps to the protocol bitrate codes used both in the sealed token
/// composite and as the `format` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    Low,
    #[default]
    Standard,
    High,
}

impl Quality {
    /// Protocol bitrate code for this tier.
    pub fn bitrate_code(self) -> &'static str {
        match self {
            Self::Low => "64",
            Self::Standard => "128",
            Self::High => "320",
        }
    }
}

/// Opaque session credential supplied by the caller.
///
/// The full value appears in request headers only; `Debug` and
/// [`masked()`](Self::masked) never reveal more than a short prefix.
#[derive(Clone)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw credential, for header construction only.
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }

    /// Redacted form safe for logs and error strings.
    pub fn masked(&self) -> String {
        match self.0.get(..4) {
            Some(prefix) if self.0.len() > 8 => format!("{prefix}…"),
            _ => "****".to_string(),
        }
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&self.masked()).finish()
    }
}

/// Catalog collaborator response for one track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,

    pub artist: String,

    #[serde(default)]
    pub album: Option<String>,

    #[serde(default)]
    pub duration_seconds: Option<u64>,

    #[serde(default)]
    pub cover_url: Option<String>,

    /// Content hash addressing the track on the CDN; 32 lowercase hex chars.
    pub image_hash: String,
}

/// Validated pipeline input for one download.
///
/// Immutable; created per request and discarded when the pipeline finishes.
#[derive(Debug, Clone)]
pub struct TrackRef {
    pub track_id: String,
    pub image_hash: String,
    pub quality: Quality,
    pub title: String,
    pub artist: String,
}

impl TrackRef {
    /// Build a pipeline input from a catalog response, validating the fields
    /// the pipeline depends on.
    pub fn from_metadata(track_id: &str, meta: &TrackMetadata, quality: Quality) -> Result<Self> {
        if track_id.is_empty() {
            return Err(VaultError::MetadataUnavailable(
                "empty track identifier".to_string(),
            ));
        }
        if !is_valid_image_hash(&meta.image_hash) {
            return Err(VaultError::MetadataUnavailable(format!(
                "malformed image hash for track {track_id}"
            )));
        }
        Ok(Self {
            track_id: track_id.to_string(),
            image_hash: meta.image_hash.clone(),
            quality,
            title: meta.title.clone(),
            artist: meta.artist.clone(),
        })
    }
}

fn is_valid_image_hash(hash: &str) -> bool {
    hash.len() == 32
        && hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
