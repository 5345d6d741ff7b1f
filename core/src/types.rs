//! Output records projected from catalog responses.
//!
//! # Design
//! `CatalogItem` is a flat, owned record: every optional wire field has
//! already been resolved to a value (empty string, zero price, `false`) by
//! the transformer, except the two classification tags, which keep an
//! explicit `None` so their slot positions survive serialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A currency amount held in minor units (cents) and rendered with two
/// decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    pub fn from_minor_units(minor: i64) -> Self {
        Price(minor)
    }

    /// Parse a wire amount in minor units. Fractional input is rounded to
    /// the nearest minor unit; anything unparsable is `None`.
    pub fn parse_minor_units(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(minor) = raw.parse::<i64>() {
            return Some(Price(minor));
        }
        let value = raw.parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(Price(value.round() as i64))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Price {
    type Err = String;

    /// Parse a major-unit decimal such as `"19.99"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s.trim().parse().map_err(|_| format!("invalid price: {s}"))?;
        if !value.is_finite() {
            return Err(format!("invalid price: {s}"));
        }
        Ok(Price((value * 100.0).round() as i64))
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.to_string()
    }
}

impl TryFrom<String> for Price {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One catalog entry as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub asin: String,
    pub url: String,
    pub list_price: Price,
    pub lowest_price: Price,
    pub title: String,
    pub available: bool,
    pub prime: bool,
    pub is_adult_product: bool,
    pub large_image: String,
    pub medium_image: String,
    pub small_image: String,
    pub description: String,
    pub features: Vec<String>,
    pub details: String,
    /// `[binding, manufacturer]`; a missing value stays in its slot as `None`.
    pub tags: [Option<String>; 2],
}

impl CatalogItem {
    pub fn binding(&self) -> Option<&str> {
        self.tags[0].as_deref()
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.tags[1].as_deref()
    }
}
