//! Request parameter assembly for the two catalog operations.
//!
//! # Design
//! `build_search_params` and `build_lookup_params` turn high-level call
//! arguments into the flat `RequestParameters` map the remote API expects.
//! A fresh map is built per call. Optional parameters are omitted rather
//! than sent empty. The only failure path is an out-of-range search page,
//! which is caught here so no request is ever signed for it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::search_index::{self, ALL};

pub const SEARCH_RESPONSE_GROUP: &str = "ItemAttributes,Offers,Images,EditorialReview";
pub const LOOKUP_RESPONSE_GROUP: &str = "ItemAttributes,Offers,Reviews,Images,EditorialReview";
pub const REVIEW_SORT: &str = "-OverallRating";

pub const MAX_PAGE: i64 = 10;
pub const MAX_PAGE_ALL: i64 = 5;

/// A single parameter value; the wire format carries both text and
/// integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Int(n)
    }
}

/// Parameter name to value, iterated in byte order of the names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParameters(BTreeMap<String, ParamValue>);

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Arguments for an item search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Search index token; `None` or empty searches every department.
    pub category: Option<String>,
    pub page: Option<i64>,
    pub keywords: Option<String>,
    /// Ignored when searching `All`.
    pub sort_by: Option<String>,
    pub availability: String,
    pub condition: String,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            category: None,
            page: None,
            keywords: None,
            sort_by: Some("salesrank".to_string()),
            availability: "Available".to_string(),
            condition: "New".to_string(),
        }
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn keywords(mut self, keywords: &str) -> Self {
        self.keywords = Some(keywords.to_string());
        self
    }

    pub fn sort_by(mut self, sort: &str) -> Self {
        self.sort_by = Some(sort.to_string());
        self
    }

    pub fn availability(mut self, availability: &str) -> Self {
        self.availability = availability.to_string();
        self
    }

    pub fn condition(mut self, condition: &str) -> Self {
        self.condition = condition.to_string();
        self
    }

    /// The search index actually sent: `All` when none was given.
    pub fn resolved_category(&self) -> &str {
        self.category.as_deref().filter(|c| !c.is_empty()).unwrap_or(ALL)
    }
}

/// Build `ItemSearch` parameters for `query`.
///
/// Pages below 1 are raised to 1. Pages above 10 (5 for `All`) fail with
/// `CatalogError::PageOutOfRange`.
pub fn build_search_params(query: &SearchQuery) -> Result<RequestParameters> {
    let category = query.resolved_category();
    let is_all = category == ALL;

    let mut params = RequestParameters::new();
    params.insert("Operation", "ItemSearch");
    params.insert("ResponseGroup", SEARCH_RESPONSE_GROUP);
    params.insert("Condition", query.condition.as_str());
    params.insert("Availability", query.availability.as_str());
    params.insert("SearchIndex", category);

    // The API rejects Sort on the catch-all index.
    if !is_all {
        if let Some(sort) = query.sort_by.as_deref().filter(|s| !s.is_empty()) {
            params.insert("Sort", sort);
        }
    }

    if let Some(keywords) = &query.keywords {
        params.insert("Keywords", keywords.as_str());
    }

    if let Some(page) = query.page {
        let page = page.max(1);
        let max = if is_all { MAX_PAGE_ALL } else { MAX_PAGE };
        if page > max {
            return Err(CatalogError::PageOutOfRange { page, max });
        }
        params.insert("ItemPage", page);
    }

    check_against_index(category, &params);
    debug!(?params, "built search parameters");
    Ok(params)
}

/// Build `ItemLookup` parameters for one or more item identifiers.
pub fn build_lookup_params<S: AsRef<str>>(item_ids: &[S], amazon_only: bool) -> RequestParameters {
    let joined = item_ids
        .iter()
        .map(|id| id.as_ref())
        .collect::<Vec<_>>()
        .join(",");

    let mut params = RequestParameters::new();
    params.insert("Operation", "ItemLookup");
    params.insert("ResponseGroup", LOOKUP_RESPONSE_GROUP);
    params.insert("ReviewSort", REVIEW_SORT);
    params.insert("ItemId", joined);
    params.insert("MerchantId", if amazon_only { "Amazon" } else { "All" });

    debug!(?params, "built lookup parameters");
    params
}

/// Log, without failing, anything the search index table says the remote
/// API will not accept.
fn check_against_index(category: &str, params: &RequestParameters) {
    let Some(index) = search_index::lookup(category) else {
        warn!(category, "search index is not in the reference table");
        return;
    };

    if let Some(ParamValue::Text(sort)) = params.get("Sort") {
        if !index.allows_sort(sort) {
            warn!(category, sort = %sort, "sort value is not listed for search index");
        }
    }

    for name in ["Availability", "Keywords", "ItemPage", "Sort"] {
        if params.contains(name) && !index.accepts(name) {
            warn!(category, parameter = name, "parameter is not accepted by search index");
        }
    }
}
