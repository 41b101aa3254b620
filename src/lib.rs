//! TrackVault retrieval core
//!
//! Reverse-engineered client for a proprietary track-delivery protocol.
//! The pipeline derives a per-track symmetric key and an obfuscated request
//! token, probes a pool of candidate CDN endpoints, streams the payload while
//! incrementally decrypting it frame by frame, and persists the result with
//! size validation.
//!
//! # Pipeline
//!
//! ```text
//! TrackRef ──► crypto::key + crypto::token
//!                  │
//!                  ▼
//!          fetch::endpoints ──► fetch::stream ──► fetch::decrypt ──► fetch::sink
//!                                                                        │
//!                                                                        ▼
//!                                                                 DownloadResult
//! ```
//!
//! The crate is a library consumed by a higher route layer; it exposes no CLI
//! surface and installs no tracing subscriber.

// Core modules
pub mod config;
pub mod crypto;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod placeholder;

// Re-export commonly used types for convenience
pub use config::RetrieverConfig;
pub use error::{ErrorKind, Result, VaultError};
pub use fetch::pipeline::{DownloadResult, Retriever};
pub use gateway::{Quality, SessionToken, TrackRef};
