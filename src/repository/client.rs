// src/repository/client.rs

//! HTTP client for repository metadata
//!
//! Provides a wrapper around reqwest with retry support for fetching JSON
//! and text documents from CRAN, Bioconductor, and GitHub.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for failed fetches
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

const USER_AGENT: &str = concat!("rverflow/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper with retry support
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::MetadataUnavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Fetch a URL and parse the body as JSON
    pub fn get_json(&self, url: &str, bearer_token: Option<&str>) -> Result<Value> {
        match self.get_json_opt(url, bearer_token)? {
            Some(value) => Ok(value),
            None => Err(Error::MetadataUnavailable(format!("HTTP 404 from {url}"))),
        }
    }

    /// Fetch a URL as JSON, mapping 404 to None
    ///
    /// A missing document is a normal answer for package lookups (unknown
    /// package, package absent from a release), distinct from the source
    /// being unreachable.
    pub fn get_json_opt(&self, url: &str, bearer_token: Option<&str>) -> Result<Option<Value>> {
        let body = match self.get_with_retry(url, bearer_token)? {
            Some(body) => body,
            None => return Ok(None),
        };
        let value = serde_json::from_str(&body)
            .map_err(|e| Error::MetadataUnavailable(format!("invalid JSON from {url}: {e}")))?;
        Ok(Some(value))
    }

    /// Fetch a URL as plain text, mapping 404 to None
    pub fn get_text_opt(&self, url: &str, bearer_token: Option<&str>) -> Result<Option<String>> {
        self.get_with_retry(url, bearer_token)
    }

    fn get_with_retry(&self, url: &str, bearer_token: Option<&str>) -> Result<Option<String>> {
        debug!("fetching {}", url);

        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut request = self.client.get(url);
            if let Some(token) = bearer_token {
                request = request.bearer_auth(token);
            }

            match request.send() {
                Ok(response) => {
                    let status = response.status();
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if status.is_success() {
                        let body = response.text().map_err(|e| {
                            Error::MetadataUnavailable(format!("failed to read body of {url}: {e}"))
                        })?;
                        return Ok(Some(body));
                    }
                    // Other 4xx statuses are definitive, retrying won't help
                    if status.is_client_error() || attempt >= self.max_retries {
                        return Err(Error::MetadataUnavailable(format!(
                            "HTTP {} from {}",
                            status, url
                        )));
                    }
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::MetadataUnavailable(format!(
                            "failed to fetch {url} after {attempt} attempts: {e}"
                        )));
                    }
                }
            }

            warn!("fetch attempt {} for {} failed, retrying...", attempt, url);
            std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
        }
    }
}
