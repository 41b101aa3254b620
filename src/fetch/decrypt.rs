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


//! Incremental frame decryption
//!
//! The encrypted stream format is a sequence of 6144-byte frames, each
//! encrypted whole with Blowfish-CBC under the per-track key and a fixed
//! 8-byte IV, cipher reset per frame, no cipher-level padding. The final
//! frame may be shorter: a tail of at least 2048 bytes is decrypted as a
//! partial frame, anything shorter is emitted unmodified (too short to hold
//! a meaningful encrypted block).
//!
//! Decryption is streaming: chunks are accumulated only until one frame is
//! complete, so frame *n* is decrypted while frame *n+1* is still arriving.
//!
//! Recoverable-error policy: a frame that fails to decrypt is emitted raw
//! (still encrypted) with a warning instead of aborting the stream — an
//! otherwise-successful download degrades to partially-corrupt audio rather
//! than no audio. If the preferred cipher cannot be instantiated at all, the
//! decryptor degrades to AES-128-CBC with a 16-byte zero-based IV and flags
//! its output best-effort; the sink's size validation is the real safety
//! net either way.

use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use tracing::warn;

use crate::crypto::key::TrackKey;
use crate::config::RetrieverConfig;

type BlowfishCbcDec = cbc::Decryptor<blowfish::Blowfish>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Fixed size of one encrypted stream frame.
pub const FRAME_SIZE: usize = 6144;

/// Minimum tail length still decrypted as a partial final frame.
pub const FLUSH_FLOOR: usize = 2048;

/// Which block cipher decrypts stream frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCipherKind {
    /// 64-bit blocks, the protocol's native cipher.
    Blowfish,
    /// 128-bit fallback; output is best-effort only.
    Aes,
}

enum FrameCipher {
    Blowfish { key: TrackKey, iv: [u8; 8] },
    Aes { key: TrackKey, iv: [u8; 16] },
}

/// Streaming decryptor for one track's frame sequence.
pub struct FrameDecryptor {
    cipher: FrameCipher,
    buffer: Vec<u8>,
    consumed: u64,
    emitted: u64,
    raw_frames: u64,
    best_effort: bool,
    finished: bool,
}

impl FrameDecryptor {
    pub fn new(key: TrackKey, config: &RetrieverConfig) -> Self {
        let (cipher, best_effort) = match config.preferred_cipher {
            FrameCipherKind::Blowfish => {
                // Probe once; key and IV lengths are fixed, so this only
                // fails when the cipher itself is unavailable.
                if BlowfishCbcDec::new_from_slices(&key, &config.frame_iv).is_ok() {
                    (
                        FrameCipher::Blowfish {
                            key,
                            iv: config.frame_iv,
                        },
                        false,
                    )
                } else {
                    warn!("blowfish unavailable, degrading to AES-128-CBC best effort");
                    (
                        FrameCipher::Aes {
                            key,
                            iv: config.fallback_iv,
                        },
                        true,
                    )
                }
            }
            FrameCipherKind::Aes => (
                FrameCipher::Aes {
                    key,
                    iv: config.fallback_iv,
                },
                true,
            ),
        };

        Self {
            cipher,
            buffer: Vec::with_capacity(FRAME_SIZE),
            consumed: 0,
            emitted: 0,
            raw_frames: 0,
            best_effort,
            finished: false,
        }
    }

    /// Feed one transport chunk, appending any completed plaintext frames to
    /// `out`. Chunk boundaries need not align with frame boundaries.
    pub fn feed(&mut self, chunk: &[u8], out: &mut Vec<u8>) {
        debug_assert!(!self.finished);
        self.consumed += chunk.len() as u64;
        self.buffer.extend_from_slice(chunk);

        while self.buffer.len() >= FRAME_SIZE {
            let mut frame: Vec<u8> = self.buffer.drain(..FRAME_SIZE).collect();
            self.decrypt_frame(&mut frame);
            self.emitted += frame.len() as u64;
            out.extend_from_slice(&frame);
        }
    }

    /// Flush at end of stream: a tail of at least [`FLUSH_FLOOR`] bytes is
    /// decrypted as a final partial frame, anything shorter passes through.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        self.finished = true;
        if self.buffer.is_empty() {
            return;
        }

        let mut tail = std::mem::take(&mut self.buffer);
        if tail.len() >= FLUSH_FLOOR {
            self.decrypt_frame(&mut tail);
        }
        self.emitted += tail.len() as u64;
        out.extend_from_slice(&tail);
    }

    /// Total bytes accepted through [`feed`](Self::feed).
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Total bytes appended to output buffers so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Bytes held back waiting for a complete frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Frames emitted raw after a decryption failure.
    pub fn raw_frames(&self) -> u64 {
        self.raw_frames
    }

    /// Whether the fallback cipher is in use and output is best-effort.
    pub fn is_best_effort(&self) -> bool {
        self.best_effort
    }

    fn decrypt_frame(&mut self, frame: &mut [u8]) {
        let decrypted = match &self.cipher {
            FrameCipher::Blowfish { key, iv } => match BlowfishCbcDec::new_from_slices(key, iv) {
                Ok(cipher) => cipher.decrypt_padded_mut::<NoPadding>(frame).is_ok(),
                Err(_) => false,
            },
            FrameCipher::Aes { key, iv } => match Aes128CbcDec::new_from_slices(key, iv) {
                Ok(cipher) => cipher.decrypt_padded_mut::<NoPadding>(frame).is_ok(),
                Err(_) => false,
            },
        };

        if !decrypted {
            // Emit the still-encrypted bytes rather than aborting the stream.
            self.raw_frames += 1;
            warn!(len = frame.len(), "frame decryption failed, emitting raw bytes");
        }
    }
}
