//! Per-track stream key derivation
//!
//! The remote encrypts each track under a key derived from nothing but the
//! track identifier and a static application secret: the two halves of the
//! id's MD5 hex digest are folded together with the secret, byte by byte.
//! A leaked key therefore compromises a single track's stream, never the
//! secret itself.

use super::md5_hex;

/// Length of a derived stream key in bytes.
pub const KEY_LENGTH: usize = 16;

/// Raw per-track symmetric key.
pub type TrackKey = [u8; KEY_LENGTH];

/// Derive the stream key for a track identifier.
///
/// `key[i] = digest[i] ^ digest[i + 16] ^ secret[i]` over the ASCII bytes of
/// the 32-character hex digest. Pure and infallible; an empty id still
/// produces a deterministic, well-shaped key (it just will not match any
/// real remote stream).
pub fn derive_track_key(track_id: &str, secret: &[u8; KEY_LENGTH]) -> TrackKey {
    let digest = md5_hex(track_id.as_bytes());
    let digest = digest.as_bytes();

    let mut key = [0u8; KEY_LENGTH];
    for i in 0..KEY_LENGTH {
        key[i] = digest[i] ^ digest[i + KEY_LENGTH] ^ secret[i];
    }
    key
}
