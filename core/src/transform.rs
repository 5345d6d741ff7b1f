//! XML response parsing and projection into `CatalogItem` records.
//!
//! # Design
//! `parse_document` hands the body to `roxmltree`; `transform` walks the
//! read-only tree. Elements are matched by local name, so the API's default
//! namespace needs no special handling. A missing optional element degrades
//! only the field it feeds; the request-level validity flag is the only
//! check that fails the whole response.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::types::{CatalogItem, Price};

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

/// Parse a response body into a navigable tree.
///
/// A blank body is `EmptyResponse`; malformed XML is `Parse`.
pub fn parse_document(body: &str) -> Result<Document<'_>> {
    if body.trim().is_empty() {
        return Err(CatalogError::EmptyResponse);
    }
    Document::parse(body).map_err(|e| CatalogError::Parse(e.to_string()))
}

/// Project every `Items/Item` element of `doc` into a `CatalogItem`, in
/// document order.
///
/// A document without an `Items` element is a zero-result response and
/// yields an empty list. A request flagged invalid fails with
/// `CatalogError::Api`.
pub fn transform(doc: &Document<'_>) -> Result<Vec<CatalogItem>> {
    let root = doc.root_element();
    if !root.children().any(|n| n.is_element()) {
        return Err(CatalogError::EmptyResponse);
    }

    let Some(items) = child(root, "Items") else {
        return Ok(Vec::new());
    };

    if text_at(items, &["Request", "IsValid"]).trim() != "True" {
        let error = path(items, &["Request", "Errors", "Error"]);
        return Err(CatalogError::Api {
            code: error.map(|e| text_at(e, &["Code"])).unwrap_or_default(),
            message: error.map(|e| text_at(e, &["Message"])).unwrap_or_default(),
        });
    }

    let result: Vec<CatalogItem> = children(items, "Item").map(project_item).collect();
    debug!(count = result.len(), "transformed catalog items");
    Ok(result)
}

fn project_item(item: Node<'_, '_>) -> CatalogItem {
    let attributes = child(item, "ItemAttributes");

    let list_price = amount_at(item, &["ItemAttributes", "ListPrice", "Amount"]);
    let lowest_price = match child(item, "OfferSummary") {
        Some(summary) => amount_at(summary, &["LowestNewPrice", "Amount"]),
        None => Price::ZERO,
    };

    let (available, prime) = match path(item, &["Offers", "Offer", "OfferListing"]) {
        Some(listing) => (
            text_at(listing, &["AvailabilityAttributes", "AvailabilityType"]) == "now",
            flag_at(listing, &["IsEligibleForPrime"]),
        ),
        None => (false, false),
    };

    let description = text_at(item, &["EditorialReviews", "EditorialReview", "Content"]);
    let features: Vec<String> = attributes
        .map(|a| children(a, "Feature").map(|f| f.text().unwrap_or_default().to_string()).collect())
        .unwrap_or_default();
    let details = derive_details(&description, &features);

    CatalogItem {
        asin: text_at(item, &["ASIN"]),
        url: text_at(item, &["DetailPageURL"]),
        list_price,
        lowest_price,
        title: text_at(item, &["ItemAttributes", "Title"]),
        available,
        prime,
        is_adult_product: flag_at(item, &["ItemAttributes", "IsAdultProduct"]),
        large_image: text_at(item, &["LargeImage", "URL"]),
        medium_image: text_at(item, &["MediumImage", "URL"]),
        small_image: text_at(item, &["SmallImage", "URL"]),
        description,
        features,
        details,
        tags: [
            optional_text_at(item, &["ItemAttributes", "Binding"]),
            optional_text_at(item, &["ItemAttributes", "Manufacturer"]),
        ],
    }
}

/// Description and features as one plain-text, sentence-cased blurb.
///
/// Tags are dropped without a trace, then anything other than ASCII
/// letters, digits, `.`, `,`, `-`, `"` and space is removed. Tabs and line
/// breaks count as disallowed. Runs of spaces are collapsed.
pub fn derive_details(description: &str, features: &[String]) -> String {
    let mut combined = description.to_string();
    for feature in features {
        combined.push(' ');
        combined.push_str(feature);
    }

    let stripped = MARKUP.replace_all(&combined, "");
    let filtered: String = stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | '-' | '"' | ' '))
        .collect();
    let collapsed = filtered.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");

    sentence_case(&collapsed)
}

/// Lowercase `text`, then capitalize its first letter and any letter that
/// directly follows `". "`.
fn sentence_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut seen_letter = false;
    let mut prev = [' ', ' '];
    for c in text.to_ascii_lowercase().chars() {
        let starts_sentence = prev == ['.', ' '];
        if c.is_ascii_alphabetic() && (!seen_letter || starts_sentence) {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        seen_letter |= c.is_ascii_alphabetic();
        prev = [prev[1], c];
    }
    out
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element() && n.tag_name().name() == name)
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn path<'a, 'input>(node: Node<'a, 'input>, names: &[&str]) -> Option<Node<'a, 'input>> {
    names.iter().try_fold(node, |current, name| child(current, name))
}

fn text_at(node: Node<'_, '_>, names: &[&str]) -> String {
    optional_text_at(node, names).unwrap_or_default()
}

/// Text of the element at `names`, or `None` when the element is missing
/// or empty.
fn optional_text_at(node: Node<'_, '_>, names: &[&str]) -> Option<String> {
    path(node, names)
        .and_then(|n| n.text())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn flag_at(node: Node<'_, '_>, names: &[&str]) -> bool {
    let value = text_at(node, names);
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn amount_at(node: Node<'_, '_>, names: &[&str]) -> Price {
    Price::parse_minor_units(&text_at(node, names)).unwrap_or(Price::ZERO)
}
