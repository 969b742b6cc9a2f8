//! Content hash to set identifier lookup.

use std::collections::BTreeSet;

use futures_util::{StreamExt, stream};
use serde::Deserialize;
use tracing::debug;

use super::http::HttpClient;
use crate::core::is_success;

pub const LOOKUP_URL: &str = "https://osu.ppy.sh/api/get_beatmaps";

/// Why a hash did not resolve. Logged, never surfaced as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionUnavailable {
    NoToken,
    Status(u16),
    Malformed,
    Empty,
    Network,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SetId {
    Text(String),
    Number(u64),
}

impl SetId {
    fn value(&self) -> Option<u64> {
        match self {
            SetId::Text(s) => s.trim().parse().ok(),
            SetId::Number(n) => Some(*n),
        }
    }
}

#[derive(Deserialize)]
struct LookupEntry {
    beatmapset_id: SetId,
}

/// Set identifier of the first entry in a lookup response body.
pub fn parse_lookup(body: &[u8]) -> Result<u64, ResolutionUnavailable> {
    let entries: Vec<LookupEntry> =
        serde_json::from_slice(body).map_err(|_| ResolutionUnavailable::Malformed)?;
    let first = entries.first().ok_or(ResolutionUnavailable::Empty)?;
    first
        .beatmapset_id
        .value()
        .filter(|&id| id != 0)
        .ok_or(ResolutionUnavailable::Malformed)
}

/// Resolves hashes against the metadata API.
pub struct ApiResolver<C> {
    client: C,
    token: Option<String>,
    base_url: String,
}

impl<C: HttpClient> ApiResolver<C> {
    /// An empty token counts as none.
    pub fn new(client: C, token: Option<String>) -> Self {
        Self {
            client,
            token: token.filter(|t| !t.trim().is_empty()),
            base_url: LOOKUP_URL.to_string(),
        }
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Set identifier for `hash`, or `None` if it cannot be determined.
    pub async fn resolve(&self, hash: &str) -> Option<u64> {
        match self.lookup(hash).await {
            Ok(set_id) => {
                debug!(hash, set_id, "resolved");
                Some(set_id)
            }
            Err(reason) => {
                debug!(hash, ?reason, "hash not resolved");
                None
            }
        }
    }

    /// Resolve every hash with at most `concurrency` lookups in flight.
    ///
    /// Unresolved hashes are dropped and duplicate identifiers collapse.
    pub async fn resolve_all<I>(&self, hashes: I, concurrency: usize) -> BTreeSet<u64>
    where
        I: IntoIterator<Item = String>,
    {
        stream::iter(hashes)
            .map(|hash| async move { self.resolve(&hash).await })
            .buffer_unordered(concurrency.max(1))
            .filter_map(|set_id| async move { set_id })
            .collect()
            .await
    }

    async fn lookup(&self, hash: &str) -> Result<u64, ResolutionUnavailable> {
        let Some(token) = &self.token else {
            return Err(ResolutionUnavailable::NoToken);
        };
        let url = format!(
            "{}?k={}&h={}",
            self.base_url,
            urlencoding::encode(token),
            urlencoding::encode(hash)
        );

        let response = self.client.get(&url).await.map_err(|e| {
            debug!(hash, error = %e, "lookup request failed");
            ResolutionUnavailable::Network
        })?;
        if !is_success(response.status) {
            return Err(ResolutionUnavailable::Status(response.status));
        }
        let body = response
            .bytes()
            .await
            .map_err(|_| ResolutionUnavailable::Network)?;
        parse_lookup(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lookup_text_id() {
        let body = br#"[{"beatmapset_id":"796338","beatmap_id":"1672217","file_md5":"67a672ab9d4bf2b12e8155b595740883"}]"#;
        assert_eq!(parse_lookup(body), Ok(796338));
    }

    #[test]
    fn test_parse_lookup_numeric_id() {
        assert_eq!(parse_lookup(br#"[{"beatmapset_id":42}]"#), Ok(42));
    }

    #[test]
    fn test_parse_lookup_failures() {
        assert_eq!(parse_lookup(b"[]"), Err(ResolutionUnavailable::Empty));
        assert_eq!(parse_lookup(b"<html>"), Err(ResolutionUnavailable::Malformed));
        assert_eq!(
            parse_lookup(br#"{"error":"Please provide a valid API key."}"#),
            Err(ResolutionUnavailable::Malformed)
        );
        assert_eq!(
            parse_lookup(br#"[{"beatmapset_id":"abc"}]"#),
            Err(ResolutionUnavailable::Malformed)
        );
        assert_eq!(
            parse_lookup(br#"[{"beatmapset_id":"0"}]"#),
            Err(ResolutionUnavailable::Malformed)
        );
    }
}
