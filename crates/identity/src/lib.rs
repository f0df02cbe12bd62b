//! Keybase identity lookup.
//!
//! Resolves a validator's declared identity (a 16-hex-char Keybase key
//! suffix) to an avatar URL. Strictly best-effort enrichment: failures are
//! surfaced as errors for the caller to log and drop, never to abort a sync
//! run.

use derive_more::Debug;
use eyre::{Context, Result};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Length of a Keybase key suffix identity.
const KEY_SUFFIX_LEN: usize = 16;

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    them: Option<Vec<LookupEntry>>,
}

#[derive(Debug, Deserialize)]
struct LookupEntry {
    #[serde(default)]
    pictures: Option<Pictures>,
}

#[derive(Debug, Deserialize)]
struct Pictures {
    #[serde(default)]
    primary: Option<Picture>,
}

#[derive(Debug, Deserialize)]
struct Picture {
    #[serde(default)]
    url: Option<String>,
}

/// Client for the Keybase user-lookup API.
#[derive(Clone, Debug)]
pub struct ProfileClient {
    #[debug(skip)]
    http: HttpClient,
    base_url: String,
}

impl ProfileClient {
    /// Create a new profile client rooted at `base_url`
    /// (normally `https://keybase.io`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.as_str().trim_end_matches('/').to_owned(),
        }
    }

    /// Resolve an identity reference to an avatar URL.
    ///
    /// Only 16-character key suffixes are looked up; anything else resolves
    /// to `None` without a network call.
    pub async fn avatar_url(&self, identity: &str) -> Result<Option<String>> {
        if identity.len() != KEY_SUFFIX_LEN {
            return Ok(None);
        }
        let url = format!(
            "{}/_/api/1.0/user/lookup.json?key_suffix={identity}&fields=pictures",
            self.base_url
        );
        debug!(identity, "keybase lookup");
        let resp: LookupResponse = self
            .http
            .get(&url)
            .send()
            .await
            .wrap_err("keybase unreachable")?
            .error_for_status()
            .wrap_err("non-success status from keybase")?
            .json()
            .await
            .wrap_err("malformed keybase response")?;

        Ok(resp
            .them
            .and_then(|them| them.into_iter().next())
            .and_then(|entry| entry.pictures)
            .and_then(|p| p.primary)
            .and_then(|p| p.url))
    }
}
