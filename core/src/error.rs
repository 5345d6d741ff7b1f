//! Error types for the catalog client.
//!
//! # Design
//! Every failure a call can hit lands in `CatalogError`. Failures that happen
//! after a signed URL exists are wrapped in `Download` so the rendered
//! message names the URL that was attempted. The orchestrating
//! `CatalogClient::search` / `lookup` methods never return these to the
//! caller; they render them into the error log instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors produced while building, signing, fetching, or transforming a
/// catalog request.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested page is outside the range the remote API accepts for
    /// the chosen search index.
    #[error("Page must be <= 10, Unless SearchIndex is All then it must be <= 5")]
    PageOutOfRange { page: i64, max: i64 },

    /// The network round-trip failed before any status was received.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body was not well-formed XML.
    #[error("XML parse failed: {0}")]
    Parse(String),

    /// The response carried no document.
    #[error("No XML response found from AWS.")]
    EmptyResponse,

    /// The remote API flagged the request as invalid.
    #[error("API ERROR ({code}) : {message}")]
    Api { code: String, message: String },

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A failure after signing, tagged with the URL that was requested.
    #[error("Error downloading data : {url} : {source}")]
    Download {
        url: String,
        #[source]
        source: Box<CatalogError>,
    },
}

impl CatalogError {
    /// Wrap `self` with the URL of the request that produced it.
    pub fn at_url(self, url: &str) -> Self {
        CatalogError::Download {
            url: url.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through any `Download` wrapper.
    pub fn root(&self) -> &CatalogError {
        match self {
            CatalogError::Download { source, .. } => source.root(),
            other => other,
        }
    }
}
