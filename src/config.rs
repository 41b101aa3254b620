//! Process-wide retrieval configuration
//!
//! All protocol constants live in one immutable struct injected at
//! construction: the static key material, cipher IVs, the token separator,
//! host fan-out shape and the fixed request headers. Nothing in here is
//! mutated at runtime; concurrent downloads share it behind an `Arc`.

use std::time::Duration;

use crate::fetch::decrypt::FrameCipherKind;

/// Minimum byte count a finished artifact must reach to count as valid.
pub const SIZE_FLOOR: u64 = 1024;

/// Immutable configuration for the retrieval pipeline.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Static 16-byte secret mixed into every derived track key.
    pub stream_secret: [u8; 16],

    /// Fixed AES-128 key sealing request tokens.
    pub token_key: [u8; 16],

    /// Non-ASCII separator joining token composite fields.
    pub separator: &'static str,

    /// 8-byte IV for Blowfish-CBC frame decryption.
    pub frame_iv: [u8; 8],

    /// 16-byte IV for the AES-128-CBC best-effort fallback cipher.
    pub fallback_iv: [u8; 16],

    /// Preferred frame cipher; the decryptor degrades to AES on its own if
    /// this one cannot be instantiated.
    pub preferred_cipher: FrameCipherKind,

    /// CDN host pattern; `{}` is replaced with a one-character shard.
    pub host_template: String,

    /// Lettered fallback shards tried after the content-addressed one.
    pub fallback_shards: &'static [char],

    /// Path version numbers for the encrypted (mobile) URL variants.
    pub path_versions: &'static [u32],

    /// Browser user-agents; one is chosen deterministically per session.
    pub user_agents: &'static [&'static str],

    /// Referrer (and origin) expected by the remote.
    pub referer: String,

    /// Base URL of the catalog metadata collaborator.
    pub gateway_base: String,

    /// Bound on a whole CDN request, connect through body.
    pub request_timeout: Duration,

    /// Bound on one catalog lookup.
    pub gateway_timeout: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            stream_secret: *b"g4el58wc0zvf9na1",
            token_key: *b"jo6aey6haid2Teih",
            separator: "\u{00a4}",
            frame_iv: [0, 1, 2, 3, 4, 5, 6, 7],
            fallback_iv: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
            preferred_cipher: FrameCipherKind::Blowfish,
            host_template: "stream-edge-{}.tvcdn.net".to_string(),
            fallback_shards: &['a', 'b', 'c', 'd', 'e'],
            path_versions: &[1, 2],
            user_agents: &[
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
                "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
            ],
            referer: "https://listen.trackvault.net/".to_string(),
            gateway_base: "https://gateway.trackvault.net/catalog/".to_string(),
            request_timeout: Duration::from_millis(30_000),
            gateway_timeout: Duration::from_secs(10),
        }
    }
}
