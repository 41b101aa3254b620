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


//! Streaming fetch against one candidate endpoint
//!
//! Opens a GET and exposes the body as a sequence of byte chunks. Chunk
//! boundaries are transport-defined, never protocol-defined — the decryptor
//! must not assume they align with frame boundaries. The request timeout is
//! set on the shared `reqwest::Client`, so it bounds the whole request
//! including the body read, and dropping the stream aborts the in-flight
//! request.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use thiserror::Error;
use tracing::debug;

use super::endpoints::CandidateEndpoint;
use crate::error::ErrorKind;

/// Failure opening or reading one candidate's stream.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Remote answered with a non-2xx status.
    #[error("remote returned status {0}")]
    BadStatus(u16),

    /// The configured timeout elapsed; the request was aborted.
    #[error("request timed out")]
    Timeout,

    /// Connection or body-read failure.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadStatus(code) => ErrorKind::BadRemoteStatus(*code),
            Self::Timeout => ErrorKind::FetchTimeout,
            Self::Transport(_) => ErrorKind::FetchTransport,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Issues streaming GETs over a shared client.
#[derive(Debug, Clone)]
pub struct StreamFetcher {
    client: reqwest::Client,
}

impl StreamFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Open the response stream for one candidate.
    pub async fn open(
        &self,
        candidate: &CandidateEndpoint,
        headers: &HeaderMap,
    ) -> Result<TrackStream, FetchError> {
        debug!(url = %candidate.url(), "opening candidate stream");
        let response = self
            .client
            .get(candidate.url().clone())
            .headers(headers.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        Ok(TrackStream {
            encrypted: candidate.is_encrypted(),
            content_length: response.content_length(),
            body: Box::pin(response.bytes_stream()),
        })
    }
}

/// An open response body, consumed chunk by chunk.
pub struct TrackStream {
    encrypted: bool,
    content_length: Option<u64>,
    body: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
}

impl TrackStream {
    /// Whether the frame decryptor must be engaged for this stream.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Advertised body size, when the remote sent one.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Next transport chunk; `Ok(None)` at end of stream.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, FetchError> {
        match self.body.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(err)) => Err(err.into()),
            None => Ok(None),
        }
    }
}
