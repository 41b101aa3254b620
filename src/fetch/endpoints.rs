//! Candidate endpoint fan-out and fixed request headers
//!
//! Purely deterministic builders, no network I/O. The CDN shards content by
//! the first hex character of the image hash; when that shard misbehaves the
//! lettered fallback hosts are tried in order. Encrypted (mobile-path) URL
//! variants are preferred over the plaintext query variants.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE, ORIGIN, REFERER, USER_AGENT};
use url::Url;

use crate::config::RetrieverConfig;
use crate::crypto::token::RequestToken;
use crate::gateway::{SessionToken, TrackRef};

/// One URL variant to try against the CDN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEndpoint {
    url: Url,
}

impl CandidateEndpoint {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether this variant serves the frame-encrypted stream format.
    pub fn is_encrypted(&self) -> bool {
        is_encrypted_path(self.url.path())
    }
}

/// Mobile/proxy path shapes carry the frame-encrypted stream; everything
/// else is plaintext audio.
pub fn is_encrypted_path(path: &str) -> bool {
    path.contains("/mobile/")
}

/// Build the prioritized candidate list for one download.
///
/// Order: for each path version, the mobile variant on every host (shard
/// host first, then the lettered fallbacks); then one plaintext query
/// variant per host.
pub fn candidates(
    track: &TrackRef,
    token: &RequestToken,
    config: &RetrieverConfig,
) -> Vec<CandidateEndpoint> {
    let shard = track.image_hash.chars().next().unwrap_or('a');
    let mut shards: Vec<char> = Vec::with_capacity(1 + config.fallback_shards.len());
    shards.push(shard);
    for &c in config.fallback_shards {
        if c != shard {
            shards.push(c);
        }
    }

    let segment = token.as_path_segment();
    let mut out = Vec::with_capacity(shards.len() * (config.path_versions.len() + 1));

    for &version in config.path_versions {
        for &s in &shards {
            let raw = format!("https://{}/mobile/{version}/{segment}", host_for(config, s));
            if let Ok(url) = Url::parse(&raw) {
                out.push(CandidateEndpoint::new(url));
            }
        }
    }
    for &s in &shards {
        let raw = format!("https://{}/api/1/{segment}", host_for(config, s));
        if let Ok(mut url) = Url::parse(&raw) {
            url.query_pairs_mut()
                .append_pair("format", track.quality.bitrate_code());
            out.push(CandidateEndpoint::new(url));
        }
    }
    out
}

fn host_for(config: &RetrieverConfig, shard: char) -> String {
    config.host_template.replace("{}", &shard.to_string())
}

/// Fixed headers the remote expects on every stream request.
///
/// The user-agent is picked deterministically from the configured list;
/// nothing rotates at runtime. The cookie value carries the session
/// credential and is marked sensitive so it never surfaces in debug output.
pub fn request_headers(session: &SessionToken, config: &RetrieverConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if !config.user_agents.is_empty() {
        let ua = config.user_agents[session.expose().len() % config.user_agents.len()];
        headers.insert(USER_AGENT, HeaderValue::from_static(ua));
    }

    if let Ok(mut cookie) = HeaderValue::from_str(&format!("arl={}; premium=1", session.expose())) {
        cookie.set_sensitive(true);
        headers.insert(COOKIE, cookie);
    }

    if let Ok(referer) = HeaderValue::from_str(&config.referer) {
        headers.insert(REFERER, referer);
    }
    if let Ok(parsed) = Url::parse(&config.referer) {
        if let Ok(origin) = HeaderValue::from_str(&parsed.origin().ascii_serialization()) {
            headers.insert(ORIGIN, origin);
        }
    }

    headers.insert(ACCEPT, HeaderValue::from_static("audio/*;q=0.9,*/*;q=0.5"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Quality;

    fn track(image_hash: &str) -> TrackRef {
        TrackRef {
            track_id: "3135556".to_string(),
            image_hash: image_hash.to_string(),
            quality: Quality::Standard,
            title: "Test".to_string(),
            artist: "Test".to_string(),
        }
    }

    fn token() -> RequestToken {
        RequestToken::Sealed("deadbeef".repeat(4))
    }

    #[test]
    fn shard_host_comes_first_and_is_deduplicated() {
        let config = RetrieverConfig::default();
        // 'd' is both the shard char and a lettered fallback
        let cands = candidates(&track("d41d8cd98f00b204e9800998ecf8427e"), &token(), &config);

        let first_host = cands[0].url().host_str().unwrap().to_string();
        assert_eq!(first_host, "stream-edge-d.tvcdn.net");

        // 5 hosts (a-e, shard deduplicated) × 2 versions + 5 query variants
        assert_eq!(cands.len(), 15);
    }

    #[test]
    fn non_lettered_shard_extends_the_host_set() {
        let config = RetrieverConfig::default();
        let cands = candidates(&track("741d8cd98f00b204e9800998ecf8427e"), &token(), &config);
        assert_eq!(cands[0].url().host_str().unwrap(), "stream-edge-7.tvcdn.net");
        // 6 hosts × 2 versions + 6 query variants
        assert_eq!(cands.len(), 18);
    }

    #[test]
    fn mobile_variants_precede_query_variants() {
        let config = RetrieverConfig::default();
        let cands = candidates(&track("a41d8cd98f00b204e9800998ecf8427e"), &token(), &config);

        let split = cands.iter().position(|c| !c.is_encrypted()).unwrap();
        assert!(cands[..split].iter().all(CandidateEndpoint::is_encrypted));
        assert!(cands[split..].iter().all(|c| !c.is_encrypted()));
        assert!(cands[split..]
            .iter()
            .all(|c| c.url().query() == Some("format=128")));
    }

    #[test]
    fn encrypted_path_detection() {
        assert!(is_encrypted_path("/mobile/1/abcdef"));
        assert!(is_encrypted_path("/mobile/2/abcdef"));
        assert!(!is_encrypted_path("/api/1/abcdef"));
    }

    #[test]
    fn headers_carry_session_cookie_and_audio_accept() {
        let config = RetrieverConfig::default();
        let headers = request_headers(&SessionToken::new("abc123"), &config);

        let cookie = headers.get(COOKIE).unwrap();
        assert!(cookie.is_sensitive());
        assert_eq!(cookie.to_str().unwrap(), "arl=abc123; premium=1");

        assert!(headers.get(USER_AGENT).is_some());
        assert!(headers.get(ACCEPT).unwrap().to_str().unwrap().starts_with("audio/"));
        assert_eq!(
            headers.get(ORIGIN).unwrap().to_str().unwrap(),
            "https://listen.trackvault.net"
        );
    }

    #[test]
    fn user_agent_choice_is_deterministic() {
        let config = RetrieverConfig::default();
        let session = SessionToken::new("abc123");
        let a = request_headers(&session, &config);
        let b = request_headers(&session, &config);
        assert_eq!(a.get(USER_AGENT), b.get(USER_AGENT));
    }
}
