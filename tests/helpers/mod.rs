//! Shared helpers for integration tests
//!
//! A minimal stub HTTP server standing in for the CDN and the catalog
//! gateway, plus frame-encryption utilities producing streams in the wire
//! format the decryptor expects.

#![allow(dead_code)]

use std::net::SocketAddr;

use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type BlowfishCbcEnc = cbc::Encryptor<blowfish::Blowfish>;

pub const FRAME_SIZE: usize = 6144;
pub const FLUSH_FLOOR: usize = 2048;
pub const FRAME_IV: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

/// One canned HTTP response served by the stub server.
pub struct StubResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Content-Length to advertise; defaults to the actual body length.
    /// Advertising more than is sent simulates a mid-body transport failure.
    pub advertised_len: Option<usize>,
}

impl StubResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body,
            advertised_len: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            advertised_len: None,
        }
    }

    pub fn truncated(body: Vec<u8>, advertised_len: usize) -> Self {
        Self {
            status: 200,
            body,
            advertised_len: Some(advertised_len),
        }
    }
}

/// Spawn a stub server answering one connection per queued response, in
/// order, then closing down.
pub async fn spawn_stub_server(responses: Vec<StubResponse>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub server");
    let addr = listener.local_addr().expect("stub server addr");

    tokio::spawn(async move {
        for response in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut request = vec![0u8; 8192];
            let _ = socket.read(&mut request).await;

            let advertised = response.advertised_len.unwrap_or(response.body.len());
            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                response.status,
                reason_phrase(response.status),
                advertised
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&response.body).await;
            let _ = socket.shutdown().await;
        }
    });

    addr
}

/// Spawn a server that accepts connections but never answers, for timeout
/// behavior.
pub async fn spawn_stalled_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stalled server");
    let addr = listener.local_addr().expect("stalled server addr");

    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut request = vec![0u8; 8192];
            let _ = socket.read(&mut request).await;
            held.push(socket);
        }
    });

    addr
}

/// A local address with nothing listening, for connection-refused candidates.
pub fn refused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("probe port");
    listener.local_addr().expect("probe addr")
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Encrypt one whole frame the way the remote does: fresh Blowfish-CBC pass
/// under the fixed IV, no cipher-level padding.
pub fn encrypt_frame(key: &[u8; 16], frame: &[u8]) -> Vec<u8> {
    assert_eq!(frame.len() % 8, 0, "frame must be block aligned");
    let mut buf = frame.to_vec();
    let cipher = BlowfishCbcEnc::new_from_slices(key, &FRAME_IV).expect("cipher init");
    cipher
        .encrypt_padded_mut::<NoPadding>(&mut buf, frame.len())
        .expect("block aligned frame");
    buf
}

/// Encrypt a plaintext stream into the wire format: full 6144-byte frames,
/// a block-aligned tail of at least 2048 bytes as a partial frame, anything
/// shorter passed through.
pub fn encrypt_stream(key: &[u8; 16], plaintext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(plaintext.len());
    let mut offset = 0;
    while plaintext.len() - offset >= FRAME_SIZE {
        out.extend_from_slice(&encrypt_frame(key, &plaintext[offset..offset + FRAME_SIZE]));
        offset += FRAME_SIZE;
    }

    let tail = &plaintext[offset..];
    if tail.len() >= FLUSH_FLOOR && tail.len() % 8 == 0 {
        out.extend_from_slice(&encrypt_frame(key, tail));
    } else {
        out.extend_from_slice(tail);
    }
    out
}

/// Deterministic pseudo-random plaintext for fixtures.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}
