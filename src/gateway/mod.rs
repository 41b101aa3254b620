//! Typed boundary to the catalog metadata collaborator
//!
//! The catalog service is a black-box HTTP API owned elsewhere; this module
//! only models its responses and validates them before anything flows into
//! the pipeline. A slow, unavailable or malformed collaborator degrades to
//! `MetadataUnavailable` rather than letting odd values travel downstream.

pub mod client;
pub mod track;

// Re-export commonly used types
pub use client::GatewayClient;
pub use track::{Quality, SessionToken, TrackMetadata, TrackRef};
