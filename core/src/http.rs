//! HTTP transport types and the fetcher seam.
//!
//! # Design
//! Requests and responses are plain data. `CatalogClient` produces an
//! `HttpRequest` (a signed GET URL) and consumes an `HttpResponse`; the
//! round-trip in between belongs to an `HttpFetcher`. Hosts that do their
//! own I/O (the FFI layer, for one) skip the fetcher and feed responses back
//! through `CatalogClient::parse_items`.
//!
//! All fields use owned types (`String`, `Vec`) so values can cross FFI
//! boundaries without lifetime concerns.

use std::time::Duration;

use tracing::debug;

use crate::error::{CatalogError, Result};

/// A GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// A GET for `url` that asks for an XML body.
    pub fn get(url: String) -> Self {
        Self {
            url,
            headers: vec![("accept".to_string(), "application/xml".to_string())],
        }
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the network round-trip for an `HttpRequest`.
///
/// Implementations return non-2xx responses as data; only failures that
/// leave no response at all (connect, DNS, timeout) are errors.
pub trait HttpFetcher {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking fetcher backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl std::fmt::Debug for UreqFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqFetcher").finish_non_exhaustive()
    }
}

impl UreqFetcher {
    /// Build a fetcher whose whole round-trip is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS))
    }
}

impl HttpFetcher for UreqFetcher {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.agent.get(request.url.as_str());
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let mut response = builder
            .call()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        debug!(status, body_len = body.len(), "catalog response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Map a non-2xx status to `CatalogError::HttpStatus`.
pub(crate) fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(CatalogError::HttpStatus {
        status: response.status,
        body: response.body.clone(),
    })
}
