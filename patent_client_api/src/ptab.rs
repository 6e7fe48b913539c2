//! HTTP client for the USPTO PTAB data API.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::{download::download_to, user_agent::get_user_agent, Error, Query, RequestParams};

/// Production base URL of the PTAB API.
pub const PTAB_BASE_URL: &str = "https://ptabdata.uspto.gov/ptab-api";

/// Blocking HTTP client for the PTAB trials and documents endpoints.
///
/// Responses are returned as raw JSON so the caller can persist them before
/// decoding.
pub struct PtabClient {
    /// Base URL for the API. Defaults to [`PTAB_BASE_URL`].
    base_api_url: String,
    http: reqwest::blocking::Client,
}

impl PtabClient {
    /// Creates a new client pointing at the production PTAB API.
    pub fn new() -> Result<Self, Error> {
        Self::with_base_url(PTAB_BASE_URL)
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(get_user_agent())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_api_url
    }

    fn get_url(&self, path: &str, query: Option<&impl Query>) -> Result<Url, Error> {
        let url = Url::parse(format!("{}{}", &self.base_api_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        Ok(match query {
            Some(query) => query.add_to_url(&url),
            None => url,
        })
    }

    /// Fetches one endpoint (`/trials` or `/documents`) with the given
    /// parameters and returns the decoded JSON body.
    pub fn get(&self, path: &str, params: &RequestParams) -> Result<Value, Error> {
        let url = self.get_url(path, Some(params))?;
        tracing::debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .header("accept", "application/json")
            .send()
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        serde_json::from_str::<Value>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::Parse(e.to_string())
        })
    }

    /// Downloads a document file to `dest`.
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64, Error> {
        download_to(self.http.get(url), dest)
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
