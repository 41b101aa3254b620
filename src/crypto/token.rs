// TrackVault - music distribution platform, track retrieval core
// Copyright (C) 2025 TrackVault contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Obfuscated request-token sealing
//!
//! The remote addresses streams by an opaque hex path segment rather than a
//! plain track id. The segment is built by hashing a composite of the track
//! identity, quality and session credential, padding it, and encrypting it
//! with AES-128-ECB under a fixed application key:
//!
//! 1. `composite = track_id ¤ image_hash ¤ bitrate ¤ session`
//! 2. `digest = md5_hex(composite)`
//! 3. `payload = digest ¤ composite ¤`
//! 4. right-pad with `'.'` to a multiple of 16 — a full extra block when the
//!    length is already aligned, so the pad amount is always in `[1, 16]`
//! 5. encrypt (cipher-level padding disabled) and hex-encode
//!
//! Sealing is a pure function of its inputs: the same track, quality and
//! session always produce the same token. If encryption is ever impossible
//! the encoder degrades to a readable fallback segment instead of erroring;
//! such a token will not satisfy the remote, and the pipeline reports the
//! degradation as the root cause when the download subsequently fails.

use std::fmt;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use chrono::Utc;

use super::md5_hex;
use crate::config::RetrieverConfig;
use crate::gateway::{Quality, SessionToken};

/// AES block size; the padded payload length is always a multiple of this.
const BLOCK_SIZE: usize = 16;

/// Obfuscated path segment identifying one stream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestToken {
    /// Hex-encoded ciphertext, the normal case.
    Sealed(String),
    /// Human-readable degraded form; will not satisfy the real remote.
    Fallback(String),
}

impl RequestToken {
    /// The value embedded into candidate URL paths.
    pub fn as_path_segment(&self) -> &str {
        match self {
            Self::Sealed(s) | Self::Fallback(s) => s,
        }
    }

    /// Whether the encoder degraded to the fallback form.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path_segment())
    }
}

/// Seal the request token for one download.
pub fn seal_request_token(
    track_id: &str,
    image_hash: &str,
    quality: Quality,
    session: &SessionToken,
    config: &RetrieverConfig,
) -> RequestToken {
    let sep = config.separator;
    let composite = format!(
        "{track_id}{sep}{image_hash}{sep}{}{sep}{}",
        quality.bitrate_code(),
        session.expose()
    );
    let digest = md5_hex(composite.as_bytes());

    let mut payload = format!("{digest}{sep}{composite}{sep}").into_bytes();
    let pad = BLOCK_SIZE - payload.len() % BLOCK_SIZE;
    payload.extend(std::iter::repeat(b'.').take(pad));

    match aes_ecb_encrypt_hex(&config.token_key, &payload) {
        Ok(sealed) => RequestToken::Sealed(sealed),
        Err(_) => RequestToken::Fallback(format!(
            "{track_id}_{image_hash}_{}_{}",
            quality.bitrate_code(),
            Utc::now().timestamp()
        )),
    }
}

/// Payload length was not a positive multiple of the block size.
#[derive(Debug)]
struct BlockAlignError;

/// AES-128-ECB over a block-aligned payload, hex-encoded.
///
/// ECB is what the remote protocol dictates; the manual `'.'` padding
/// upstream is the only padding in play.
fn aes_ecb_encrypt_hex(key: &[u8; 16], data: &[u8]) -> Result<String, BlockAlignError> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(BlockAlignError);
    }

    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut ciphertext = Vec::with_capacity(data.len());
    for chunk in data.chunks(BLOCK_SIZE) {
        let mut block = GenericArray::clone_from_slice(chunk);
        cipher.encrypt_block(&mut block);
        ciphertext.extend_from_slice(&block);
    }
    Ok(hex::encode(ciphertext))
}
