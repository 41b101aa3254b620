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


//! Download orchestration
//!
//! [`Retriever`] drives the whole state machine for one download:
//!
//! `Start → TokenBuilt → EndpointSelected → Fetching → {Streaming |
//! Decrypting}* → Validating → {Success | Failed(kind)}`
//!
//! Candidate endpoints are tried strictly in order; a candidate that fails
//! before yielding body bytes (bad status, connect error, timeout on open)
//! is skipped and the next one tried. Once body bytes have been consumed
//! there is no advancing — restarting another candidate mid-write would
//! interleave two streams — so mid-body failures are terminal. Frame-level
//! decryption failures never terminate anything; the decryptor absorbs them.
//!
//! Concurrent downloads share only the `reqwest` connection pool and the
//! immutable config; each owns its destination path.

use std::path::Path;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::decrypt::FrameDecryptor;
use super::endpoints::{candidates, request_headers, CandidateEndpoint};
use super::progress::{PipelinePhase, ProgressCallback, ProgressTracker};
use super::sink::FileSink;
use super::stream::StreamFetcher;
use crate::config::{RetrieverConfig, SIZE_FLOOR};
use crate::crypto::key::{derive_track_key, TrackKey};
use crate::crypto::token::seal_request_token;
use crate::error::{ErrorKind, Result};
use crate::gateway::{GatewayClient, Quality, SessionToken, TrackRef};

/// Outcome of one download, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub success: bool,
    pub bytes_written: u64,
    pub error_kind: Option<ErrorKind>,
}

impl DownloadResult {
    pub fn ok(bytes_written: u64) -> Self {
        Self {
            success: true,
            bytes_written,
            error_kind: None,
        }
    }

    pub fn failed(kind: ErrorKind) -> Self {
        Self {
            success: false,
            bytes_written: 0,
            error_kind: Some(kind),
        }
    }
}

/// The retrieval pipeline for third-party track streams.
pub struct Retriever {
    config: Arc<RetrieverConfig>,
    fetcher: StreamFetcher,
    gateway: GatewayClient,
    progress: Option<ProgressCallback>,
}

impl Retriever {
    pub fn new(config: RetrieverConfig) -> Result<Self> {
        let gateway = GatewayClient::new(&config.gateway_base, config.gateway_timeout)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            fetcher: StreamFetcher::new(client),
            gateway,
            progress: None,
        })
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Resolve a bare track id through the catalog gateway, then download.
    pub async fn resolve_and_download(
        &self,
        track_id: &str,
        quality: Quality,
        session: &SessionToken,
        dest: &Path,
    ) -> DownloadResult {
        let meta = match self.gateway.lookup_track(track_id).await {
            Ok(meta) => meta,
            Err(err) => {
                warn!(%track_id, error = %err, "metadata lookup failed");
                return DownloadResult::failed(err.kind());
            }
        };
        let track = match TrackRef::from_metadata(track_id, &meta, quality) {
            Ok(track) => track,
            Err(err) => return DownloadResult::failed(err.kind()),
        };
        self.download_track(&track, session, dest).await
    }

    /// Run the full pipeline for one validated track.
    pub async fn download_track(
        &self,
        track: &TrackRef,
        session: &SessionToken,
        dest: &Path,
    ) -> DownloadResult {
        let mut tracker = ProgressTracker::new(
            track.track_id.clone(),
            track.title.clone(),
            self.progress.clone(),
        );

        let key = derive_track_key(&track.track_id, &self.config.stream_secret);
        let token = seal_request_token(
            &track.track_id,
            &track.image_hash,
            track.quality,
            session,
            &self.config,
        );
        if token.is_fallback() {
            warn!(track_id = %track.track_id, "request token degraded to fallback form");
        }
        tracker.phase(PipelinePhase::TokenBuilt);

        let headers = request_headers(session, &self.config);
        let endpoints = candidates(track, &token, &self.config);

        let mut result = self
            .run_candidates(&endpoints, &key, &headers, dest, &mut tracker)
            .await;

        // A fallback token cannot satisfy the remote; report the root cause
        // instead of the symptomatic exhaustion.
        if token.is_fallback() && result.error_kind == Some(ErrorKind::AllEndpointsExhausted) {
            result.error_kind = Some(ErrorKind::TokenEncodingDegraded);
        }
        result
    }

    /// Drive the candidate loop over an explicit endpoint list.
    pub async fn download_from_candidates(
        &self,
        endpoints: &[CandidateEndpoint],
        key: &TrackKey,
        headers: &HeaderMap,
        dest: &Path,
    ) -> DownloadResult {
        let mut tracker = ProgressTracker::new(String::new(), String::new(), self.progress.clone());
        self.run_candidates(endpoints, key, headers, dest, &mut tracker)
            .await
    }

    async fn run_candidates(
        &self,
        endpoints: &[CandidateEndpoint],
        key: &TrackKey,
        headers: &HeaderMap,
        dest: &Path,
        tracker: &mut ProgressTracker,
    ) -> DownloadResult {
        for (index, candidate) in endpoints.iter().enumerate() {
            tracker.candidate(index);
            tracker.phase(PipelinePhase::EndpointSelected);
            tracker.phase(PipelinePhase::Fetching);

            let stream = match self.fetcher.open(candidate, headers).await {
                Ok(stream) => stream,
                Err(err) => {
                    debug!(url = %candidate.url(), error = %err, "candidate failed, advancing");
                    continue;
                }
            };

            let result = self.consume_stream(stream, key, dest, tracker).await;
            tracker.phase(if result.success {
                PipelinePhase::Complete
            } else {
                PipelinePhase::Failed
            });
            return result;
        }

        warn!(tried = endpoints.len(), "all candidate endpoints exhausted");
        tracker.phase(PipelinePhase::Failed);
        DownloadResult::failed(ErrorKind::AllEndpointsExhausted)
    }

    async fn consume_stream(
        &self,
        mut stream: super::stream::TrackStream,
        key: &TrackKey,
        dest: &Path,
        tracker: &mut ProgressTracker,
    ) -> DownloadResult {
        tracker.phase(if stream.is_encrypted() {
            PipelinePhase::Decrypting
        } else {
            PipelinePhase::Streaming
        });

        let mut sink = match FileSink::create(dest).await {
            Ok(sink) => sink,
            Err(err) => return DownloadResult::failed(err.kind()),
        };
        let mut decryptor = stream
            .is_encrypted()
            .then(|| FrameDecryptor::new(*key, &self.config));
        let mut plaintext = Vec::new();

        loop {
            match stream.next_chunk().await {
                Ok(Some(chunk)) => {
                    plaintext.clear();
                    match decryptor.as_mut() {
                        Some(decryptor) => decryptor.feed(&chunk, &mut plaintext),
                        None => plaintext.extend_from_slice(&chunk),
                    }
                    if let Err(err) = sink.write(&plaintext).await {
                        sink.abort().await;
                        return DownloadResult::failed(err.kind());
                    }
                    tracker.bytes(sink.bytes_written());
                }
                Ok(None) => break,
                Err(err) => {
                    // Body bytes may already be on disk; advancing to another
                    // candidate would interleave two streams.
                    warn!(error = %err, "stream failed mid-body");
                    sink.abort().await;
                    return DownloadResult::failed(err.kind());
                }
            }
        }

        if let Some(decryptor) = decryptor.as_mut() {
            plaintext.clear();
            decryptor.finish(&mut plaintext);
            if let Err(err) = sink.write(&plaintext).await {
                sink.abort().await;
                return DownloadResult::failed(err.kind());
            }
        }

        tracker.phase(PipelinePhase::Validating);
        match sink.finalize(SIZE_FLOOR).await {
            Ok(bytes_written) => DownloadResult::ok(bytes_written),
            Err(err) => DownloadResult::failed(err.kind()),
        }
    }
}
