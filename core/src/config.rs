//! Client configuration: credentials, marketplace region, and transport
//! settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

pub const DEFAULT_ASSOCIATE_TAG: &str = "mmxca06-20";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Marketplace the requests are addressed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Br,
    Ca,
    Cn,
    De,
    Es,
    Fr,
    In,
    It,
    Jp,
    Mx,
    Uk,
    #[default]
    Us,
}

impl Region {
    /// Host serving the Product Advertising API for this marketplace.
    pub fn host(&self) -> &'static str {
        match self {
            Region::Br => "webservices.amazon.com.br",
            Region::Ca => "webservices.amazon.ca",
            Region::Cn => "webservices.amazon.cn",
            Region::De => "webservices.amazon.de",
            Region::Es => "webservices.amazon.es",
            Region::Fr => "webservices.amazon.fr",
            Region::In => "webservices.amazon.in",
            Region::It => "webservices.amazon.it",
            Region::Jp => "webservices.amazon.co.jp",
            Region::Mx => "webservices.amazon.com.mx",
            Region::Uk => "webservices.amazon.co.uk",
            Region::Us => "webservices.amazon.com",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Region::Br => "br",
            Region::Ca => "ca",
            Region::Cn => "cn",
            Region::De => "de",
            Region::Es => "es",
            Region::Fr => "fr",
            Region::In => "in",
            Region::It => "it",
            Region::Jp => "jp",
            Region::Mx => "mx",
            Region::Uk => "uk",
            Region::Us => "us",
        }
    }
}

impl FromStr for Region {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        let region = match s.to_ascii_lowercase().as_str() {
            "br" => Region::Br,
            "ca" => Region::Ca,
            "cn" => Region::Cn,
            "de" => Region::De,
            "es" => Region::Es,
            "fr" => Region::Fr,
            "in" => Region::In,
            "it" => Region::It,
            "jp" => Region::Jp,
            "mx" => Region::Mx,
            "uk" => Region::Uk,
            "us" => Region::Us,
            other => return Err(CatalogError::Config(format!("unknown region code: {other}"))),
        };
        Ok(region)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Everything a `CatalogClient` needs to reach the remote API.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub access_key: String,
    pub secret_key: String,
    #[serde(default = "default_associate_tag")]
    pub associate_tag: String,
    #[serde(default)]
    pub region: Region,
    /// Replaces `https://{region host}`; used to point at a local server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_associate_tag() -> String {
    DEFAULT_ASSOCIATE_TAG.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ClientConfig {
    pub fn new(access_key: &str, secret_key: &str, region: Region) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            associate_tag: default_associate_tag(),
            region,
            endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_associate_tag(mut self, tag: &str) -> Self {
        self.associate_tag = tag.to_string();
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    /// Read configuration from `PAAPI_*` environment variables.
    ///
    /// `PAAPI_ACCESS_KEY` and `PAAPI_SECRET_KEY` are required;
    /// `PAAPI_ASSOCIATE_TAG`, `PAAPI_REGION`, `PAAPI_ENDPOINT` and
    /// `PAAPI_TIMEOUT_SECS` fall back to defaults.
    pub fn from_env() -> Result<Self> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| CatalogError::Config(format!("{name} is not set")))
        };
        let access_key = required("PAAPI_ACCESS_KEY")?;
        let secret_key = required("PAAPI_SECRET_KEY")?;

        let region = match std::env::var("PAAPI_REGION") {
            Ok(code) => code.parse()?,
            Err(_) => Region::default(),
        };
        let mut config = ClientConfig::new(&access_key, &secret_key, region);

        if let Ok(tag) = std::env::var("PAAPI_ASSOCIATE_TAG") {
            config.associate_tag = tag;
        }
        if let Ok(endpoint) = std::env::var("PAAPI_ENDPOINT") {
            config = config.with_endpoint(&endpoint);
        }
        if let Ok(timeout) = std::env::var("PAAPI_TIMEOUT_SECS") {
            config.timeout_secs = timeout
                .parse()
                .map_err(|_| CatalogError::Config(format!("PAAPI_TIMEOUT_SECS is not a number: {timeout}")))?;
        }
        Ok(config)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("associate_tag", &self.associate_tag)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
