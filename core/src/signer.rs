//! Signed URL generation for Product Advertising API requests.
//!
//! The canonical query string is the parameter map plus the credential and
//! service fields, sorted by name and RFC 3986 encoded. It is signed with
//! HMAC-SHA256 over `GET\n{host}\n/onca/xml\n{query}` and the base64 digest
//! is appended as `Signature`.

use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;

use crate::config::{ClientConfig, Region};
use crate::error::{CatalogError, Result};
use crate::params::RequestParameters;

pub const SERVICE: &str = "AWSECommerceService";
pub const API_VERSION: &str = "2013-08-01";
pub const REQUEST_PATH: &str = "/onca/xml";

/// RFC 3986 unreserved characters stay as-is; everything else is escaped.
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

type HmacSha256 = Hmac<Sha256>;

/// Turns a parameter map into a fully-qualified, signed request URL.
pub trait RequestSigner {
    fn generate(&self, params: &RequestParameters) -> Result<String>;
}

/// Product Advertising API signer.
#[derive(Clone)]
pub struct UrlBuilder {
    access_key: String,
    secret_key: String,
    associate_tag: String,
    scheme: String,
    host: String,
}

impl UrlBuilder {
    pub fn new(access_key: &str, secret_key: &str, associate_tag: &str, region: Region) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            associate_tag: associate_tag.to_string(),
            scheme: "https".to_string(),
            host: region.host().to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let builder = Self::new(
            &config.access_key,
            &config.secret_key,
            &config.associate_tag,
            config.region,
        );
        match &config.endpoint {
            Some(endpoint) => builder.with_endpoint(endpoint),
            None => builder,
        }
    }

    /// Address requests to `endpoint` (`scheme://host[:port]`) instead of the
    /// region's host. A missing scheme means `https`.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        let endpoint = endpoint.trim_end_matches('/');
        match endpoint.split_once("://") {
            Some((scheme, host)) => {
                self.scheme = scheme.to_string();
                self.host = host.to_string();
            }
            None => {
                self.scheme = "https".to_string();
                self.host = endpoint.to_string();
            }
        }
        self
    }

    /// Sign `params` as if the request were issued at `timestamp`.
    pub fn sign_at(&self, params: &RequestParameters, timestamp: DateTime<Utc>) -> Result<String> {
        let query = self.canonical_query(params, timestamp);
        let string_to_sign = format!("GET\n{}\n{REQUEST_PATH}\n{query}", self.host);

        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| CatalogError::Signing(e.to_string()))?;
        mac.update(string_to_sign.as_bytes());
        let signature =
            base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        Ok(format!(
            "{}://{}{REQUEST_PATH}?{query}&Signature={}",
            self.scheme,
            self.host,
            encode(&signature)
        ))
    }

    /// Sorted, encoded `name=value` pairs joined with `&`.
    fn canonical_query(&self, params: &RequestParameters, timestamp: DateTime<Utc>) -> String {
        let mut full = params.clone();
        full.insert("AWSAccessKeyId", self.access_key.as_str());
        full.insert("AssociateTag", self.associate_tag.as_str());
        full.insert("Service", SERVICE);
        full.insert("Timestamp", timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string());
        full.insert("Version", API_VERSION);

        full.iter()
            .map(|(name, value)| format!("{}={}", encode(name), encode(&value.to_string())))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl RequestSigner for UrlBuilder {
    fn generate(&self, params: &RequestParameters) -> Result<String> {
        self.sign_at(params, Utc::now())
    }
}

impl std::fmt::Debug for UrlBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlBuilder")
            .field("access_key", &self.access_key)
            .field("associate_tag", &self.associate_tag)
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, RFC3986).to_string()
}
