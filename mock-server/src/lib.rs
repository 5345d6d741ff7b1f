//! Stand-in for the Product Advertising API.
//!
//! Serves `GET /onca/xml` for the `ItemSearch` and `ItemLookup` operations
//! from the fixed catalog in `catalog`. Signatures are required but not
//! verified. Request-level problems the real service reports inside a 200
//! response (bad item id, Sort on `All`, page out of range) are reported the
//! same way; missing credentials and unknown operations get a 400.

pub mod catalog;

use axum::{
    extract::Query,
    http::{header, StatusCode},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::debug;
use uuid::Uuid;

use catalog::{Product, NAMESPACE, PRODUCTS};

pub const PAGE_SIZE: usize = 10;

const NO_MATCHES: &str = "<Errors><Error><Code>AWS.ECommerceService.NoExactMatches</Code><Message>We did not find any matches for your request.</Message></Error></Errors>";

type XmlReply = (StatusCode, [(header::HeaderName, &'static str); 1], String);

pub fn app() -> Router {
    Router::new().route("/onca/xml", get(handle))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Query string of a catalog request. Every field is optional so that a
/// missing value can be reported in the API's own error format.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogRequest {
    pub operation: Option<String>,
    #[serde(rename = "AWSAccessKeyId")]
    pub access_key_id: Option<String>,
    pub associate_tag: Option<String>,
    pub timestamp: Option<String>,
    pub signature: Option<String>,
    pub search_index: Option<String>,
    pub keywords: Option<String>,
    pub sort: Option<String>,
    pub item_page: Option<String>,
    pub availability: Option<String>,
    pub item_id: Option<String>,
    pub merchant_id: Option<String>,
}

impl CatalogRequest {
    fn missing_credential(&self) -> Option<&'static str> {
        [
            ("AWSAccessKeyId", &self.access_key_id),
            ("AssociateTag", &self.associate_tag),
            ("Timestamp", &self.timestamp),
            ("Signature", &self.signature),
        ]
        .into_iter()
        .find(|(_, value)| value.is_none())
        .map(|(name, _)| name)
    }
}

async fn handle(Query(request): Query<CatalogRequest>) -> XmlReply {
    let request_id = Uuid::new_v4();
    let operation = request.operation.as_deref().unwrap_or_default();
    debug!(operation, %request_id, "catalog request");

    if let Some(required) = request.missing_credential() {
        return error_reply(
            operation,
            request_id,
            "MissingParameter",
            &format!("Your request is missing required parameter {required}."),
        );
    }

    let body = match operation {
        "ItemSearch" => item_search(&request, request_id),
        "ItemLookup" => item_lookup(&request, request_id),
        other => {
            return error_reply(
                other,
                request_id,
                "InvalidParameterValue",
                &format!("{other} is not a valid value for Operation."),
            )
        }
    };
    xml_reply(StatusCode::OK, body)
}

fn item_search(request: &CatalogRequest, request_id: Uuid) -> String {
    let search_index = request.search_index.as_deref().unwrap_or("All");
    let is_all = search_index == "All";

    if is_all && request.sort.is_some() {
        return invalid(
            "ItemSearch",
            request_id,
            "AWS.InvalidParameterCombination",
            "Your request contained a restricted parameter combination. When SearchIndex equals All, Sort cannot be present.",
        );
    }

    let page: usize = request
        .item_page
        .as_deref()
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let max_page = if is_all { 5 } else { 10 };
    if page < 1 || page > max_page {
        return invalid(
            "ItemSearch",
            request_id,
            "AWS.ParameterOutOfRange",
            &format!("The value you specified for ItemPage is invalid. Valid values must be between 1 and {max_page}."),
        );
    }

    let keywords = request.keywords.as_deref().unwrap_or_default();
    let available_only = request.availability.as_deref() == Some("Available");
    let mut hits: Vec<&Product> = PRODUCTS
        .iter()
        .filter(|p| is_all || p.search_index == search_index)
        .filter(|p| p.matches(keywords))
        .filter(|p| !available_only || p.availability.is_some())
        .collect();

    match request.sort.as_deref() {
        Some("price") => hits.sort_by_key(|p| p.price_for_sort()),
        Some("-price") => hits.sort_by_key(|p| std::cmp::Reverse(p.price_for_sort())),
        _ => {}
    }

    let total = hits.len();
    let page_items: Vec<&Product> = hits.into_iter().skip((page - 1) * PAGE_SIZE).take(PAGE_SIZE).collect();

    let errors = if page_items.is_empty() { NO_MATCHES } else { "" };
    let mut items = format!(
        "<Request><IsValid>True</IsValid>{errors}</Request><TotalResults>{total}</TotalResults><TotalPages>{}</TotalPages>",
        total.div_ceil(PAGE_SIZE)
    );
    for product in page_items {
        items.push_str(&product.to_xml(false));
    }
    document("ItemSearch", request_id, &items)
}

fn item_lookup(request: &CatalogRequest, request_id: Uuid) -> String {
    let amazon_only = request.merchant_id.as_deref() == Some("Amazon");
    let ids = request.item_id.as_deref().unwrap_or_default();

    let mut products = Vec::new();
    for id in ids.split(',').map(str::trim) {
        match catalog::find(id) {
            Some(product) => products.push(product),
            None => {
                return invalid(
                    "ItemLookup",
                    request_id,
                    "AWS.InvalidParameterValue",
                    &format!("{id} is not a valid value for ItemId. Please change this value and retry your request."),
                )
            }
        }
    }

    let mut items = String::from("<Request><IsValid>True</IsValid></Request>");
    for product in products {
        items.push_str(&product.to_xml(amazon_only));
    }
    document("ItemLookup", request_id, &items)
}

/// A 200 response whose request is flagged invalid.
fn invalid(operation: &str, request_id: Uuid, code: &str, message: &str) -> String {
    document(
        operation,
        request_id,
        &format!(
            "<Request><IsValid>False</IsValid><Errors><Error><Code>{code}</Code><Message>{}</Message></Error></Errors></Request>",
            catalog::escape(message)
        ),
    )
}

fn document(operation: &str, request_id: Uuid, items: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><{operation}Response xmlns="{NAMESPACE}"><OperationRequest><RequestId>{request_id}</RequestId></OperationRequest><Items>{items}</Items></{operation}Response>"#
    )
}

fn error_reply(operation: &str, request_id: Uuid, code: &str, message: &str) -> XmlReply {
    let root = if operation == "ItemLookup" { "ItemLookup" } else { "ItemSearch" };
    let body = format!(
        r#"<?xml version="1.0"?><{root}ErrorResponse xmlns="{NAMESPACE}"><Error><Code>{code}</Code><Message>{}</Message></Error><RequestId>{request_id}</RequestId></{root}ErrorResponse>"#,
        catalog::escape(message)
    );
    xml_reply(StatusCode::BAD_REQUEST, body)
}

fn xml_reply(status: StatusCode, body: String) -> XmlReply {
    (status, [(header::CONTENT_TYPE, "text/xml;charset=UTF-8")], body)
}
