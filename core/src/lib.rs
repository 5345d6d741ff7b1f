//! Synchronous client core for the Product Advertising catalog API.
//!
//! # Overview
//! Turns item-search and item-lookup arguments into signed request URLs,
//! fetches the XML response, and projects each returned item into a flat
//! `CatalogItem`.
//!
//! # Design
//! - `params` builds the flat parameter map and owns the only validation
//!   (search paging bounds). `search_index` is the static department table
//!   it consults.
//! - `signer::RequestSigner` and `http::HttpFetcher` are the two seams to the
//!   outside world; `UrlBuilder` and `UreqFetcher` are the stock
//!   implementations.
//! - `transform` parses the body with `roxmltree` and projects items.
//! - `CatalogClient` sequences the pieces. Its `search` / `lookup` methods
//!   report failure as `None` plus an entry in an append-only error log;
//!   `try_*` and the `build_*` / `parse_items` split return `Result`s.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod search_index;
pub mod signer;
pub mod transform;
pub mod types;

pub use client::CatalogClient;
pub use config::{ClientConfig, Region};
pub use error::{CatalogError, Result};
pub use http::{HttpFetcher, HttpRequest, HttpResponse, UreqFetcher};
pub use params::{build_lookup_params, build_search_params, ParamValue, RequestParameters, SearchQuery};
pub use search_index::SearchIndex;
pub use signer::{RequestSigner, UrlBuilder};
pub use transform::{parse_document, transform};
pub use types::{CatalogItem, Price};
