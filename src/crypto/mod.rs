//! Key derivation and request-token sealing
//!
//! Pure functions shared by every download: [`key`] turns a track identifier
//! into its 16-byte stream key, [`token`] seals the obfuscated request token
//! embedded into candidate URLs. No I/O, no shared state; safe to call from
//! any number of concurrent downloads.

pub mod key;
pub mod token;

// Re-export commonly used types
pub use key::{derive_track_key, TrackKey};
pub use token::{seal_request_token, RequestToken};

use md5::{Digest, Md5};

/// MD5 digest as a 32-character lowercase hex string.
pub(crate) fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
