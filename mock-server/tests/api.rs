use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use tower::ServiceExt;

const CREDENTIALS: &str = "AWSAccessKeyId=AK&AssociateTag=tag-20&Timestamp=2024-01-01T00%3A00%3A00Z&Signature=sig";

async fn get(query: &str) -> (StatusCode, String) {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri(format!("/onca/xml?{query}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Text of every `ASIN` element in `body`, in document order.
fn asins(body: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(body).unwrap();
    doc.descendants()
        .filter(|n| n.tag_name().name() == "ASIN")
        .filter_map(|n| n.text().map(str::to_string))
        .collect()
}

fn text_of(body: &str, name: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(body).unwrap();
    doc.descendants()
        .find(|n| n.tag_name().name() == name)
        .and_then(|n| n.text().map(str::to_string))
}

// --- credentials ---

#[tokio::test]
async fn missing_signature_returns_400() {
    let (status, body) = get("Operation=ItemSearch&AWSAccessKeyId=AK&AssociateTag=t&Timestamp=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text_of(&body, "Code").as_deref(), Some("MissingParameter"));
}

#[tokio::test]
async fn unknown_operation_returns_400() {
    let (status, body) = get(&format!("Operation=CartCreate&{CREDENTIALS}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("ItemSearchErrorResponse"));
}

// --- search ---

#[tokio::test]
async fn search_all_lists_available_products() {
    let (status, body) = get(&format!("Operation=ItemSearch&SearchIndex=All&Availability=Available&{CREDENTIALS}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text_of(&body, "IsValid").as_deref(), Some("True"));
    assert_eq!(
        asins(&body),
        vec!["B00KETTLE1", "B00TOASTER", "B00RUSTBK1", "B00CHARGER", "B00CRAYONS"]
    );
}

#[tokio::test]
async fn search_filters_by_index_and_keywords() {
    let (_, body) = get(&format!(
        "Operation=ItemSearch&SearchIndex=Appliances&Keywords=electric%20kettle&Sort=salesrank&{CREDENTIALS}"
    ))
    .await;
    assert_eq!(asins(&body), vec!["B00KETTLE1"]);
}

#[tokio::test]
async fn search_sorts_by_price() {
    let (_, body) = get(&format!("Operation=ItemSearch&SearchIndex=Appliances&Sort=-price&{CREDENTIALS}")).await;
    assert_eq!(asins(&body), vec!["B00TOASTER", "B00KETTLE1"]);
}

#[tokio::test]
async fn sort_on_all_is_rejected_in_band() {
    let (status, body) = get(&format!("Operation=ItemSearch&SearchIndex=All&Sort=price&{CREDENTIALS}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text_of(&body, "IsValid").as_deref(), Some("False"));
    assert_eq!(text_of(&body, "Code").as_deref(), Some("AWS.InvalidParameterCombination"));
}

#[tokio::test]
async fn page_past_results_has_no_items() {
    let (_, body) = get(&format!("Operation=ItemSearch&SearchIndex=Books&ItemPage=2&{CREDENTIALS}")).await;
    assert_eq!(text_of(&body, "IsValid").as_deref(), Some("True"));
    assert!(asins(&body).is_empty());
    assert_eq!(text_of(&body, "Code").as_deref(), Some("AWS.ECommerceService.NoExactMatches"));
}

#[tokio::test]
async fn page_out_of_range_is_rejected_in_band() {
    let (_, body) = get(&format!("Operation=ItemSearch&SearchIndex=All&ItemPage=6&{CREDENTIALS}")).await;
    assert_eq!(text_of(&body, "Code").as_deref(), Some("AWS.ParameterOutOfRange"));
}

// --- lookup ---

#[tokio::test]
async fn lookup_returns_items_in_request_order() {
    let (_, body) = get(&format!("Operation=ItemLookup&ItemId=B00WIPER01%2CB00KETTLE1&MerchantId=All&{CREDENTIALS}")).await;
    assert_eq!(asins(&body), vec!["B00WIPER01", "B00KETTLE1"]);
}

#[tokio::test]
async fn lookup_unknown_item_is_invalid() {
    let (_, body) = get(&format!("Operation=ItemLookup&ItemId=B00KETTLE1%2CNOPE&{CREDENTIALS}")).await;
    assert_eq!(text_of(&body, "IsValid").as_deref(), Some("False"));
    assert_eq!(text_of(&body, "Code").as_deref(), Some("AWS.InvalidParameterValue"));
    assert!(text_of(&body, "Message").unwrap().starts_with("NOPE is not a valid value for ItemId"));
}

#[tokio::test]
async fn lookup_amazon_only_hides_third_party_offers() {
    let (_, body) = get(&format!("Operation=ItemLookup&ItemId=B00TOASTER&MerchantId=Amazon&{CREDENTIALS}")).await;
    assert!(!body.contains("<OfferListing>"));
    let (_, body) = get(&format!("Operation=ItemLookup&ItemId=B00TOASTER&MerchantId=All&{CREDENTIALS}")).await;
    assert!(body.contains("<OfferListing>"));
}
