//! Catalog client: parameters, signing, fetch, parse, transform.
//!
//! # Design
//! `CatalogClient` offers the pipeline at three levels:
//! - `build_*` / `parse_items` split the call around the network so a host
//!   can perform the round-trip itself. `prepare_*` / `parse_prepared` are
//!   the same two steps with the bookkeeping of `search` / `lookup`: kept
//!   parameters and URL, and failures logged against that URL.
//! - `try_search` / `try_lookup` run the whole pipeline through the
//!   configured `HttpFetcher` and return a `Result`; they leave the client
//!   untouched and are the form to use from concurrent callers.
//! - `search` / `lookup` run the same pipeline but never surface an error:
//!   a failure is appended to the client's error log and the call returns
//!   `None`. The parameters of the latest call are kept for diagnostics.
//!
//! Nothing is retried.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{CatalogError, Result};
use crate::http::{check_status, HttpFetcher, HttpRequest, HttpResponse, UreqFetcher};
use crate::params::{build_lookup_params, build_search_params, RequestParameters, SearchQuery};
use crate::signer::{RequestSigner, UrlBuilder};
use crate::transform::{parse_document, transform};
use crate::types::CatalogItem;

/// Client for the product catalog API.
#[derive(Debug)]
pub struct CatalogClient<S = UrlBuilder, F = UreqFetcher> {
    signer: S,
    fetcher: F,
    errors: Vec<String>,
    last_params: Option<RequestParameters>,
    last_url: Option<String>,
}

impl CatalogClient {
    /// A client that signs with the configured credentials and fetches over
    /// `ureq` with the configured timeout.
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_parts(
            UrlBuilder::from_config(config),
            UreqFetcher::new(Duration::from_secs(config.timeout_secs)),
        )
    }
}

impl<S: RequestSigner, F: HttpFetcher> CatalogClient<S, F> {
    pub fn with_parts(signer: S, fetcher: F) -> Self {
        Self {
            signer,
            fetcher,
            errors: Vec::new(),
            last_params: None,
            last_url: None,
        }
    }

    /// Search the catalog. Returns `None` on any failure; see `errors()`.
    pub fn search(&mut self, query: &SearchQuery) -> Option<Vec<CatalogItem>> {
        let outcome = build_search_params(query).and_then(|params| self.run(params));
        self.settle(outcome)
    }

    /// Look up one or more items by identifier. Returns `None` on any
    /// failure; see `errors()`.
    pub fn lookup<I: AsRef<str>>(&mut self, item_ids: &[I], amazon_only: bool) -> Option<Vec<CatalogItem>> {
        let params = build_lookup_params(item_ids, amazon_only);
        let outcome = self.run(params);
        self.settle(outcome)
    }

    /// Every error recorded by `search` / `lookup`, oldest first.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Parameters of the latest `search` / `lookup` that got past
    /// validation; `None` if the latest call failed validation.
    pub fn last_params(&self) -> Option<&RequestParameters> {
        self.last_params.as_ref()
    }

    /// Signed URL of the latest request built through `search`, `lookup` or
    /// `prepare_*`.
    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }

    /// Append an error to the log. Used by hosts that drive the
    /// `build_*` / `parse_items` split themselves.
    pub fn record_error(&mut self, error: &CatalogError) {
        warn!(%error, "catalog call failed");
        self.errors.push(error.to_string());
    }

    pub fn try_search(&self, query: &SearchQuery) -> Result<Vec<CatalogItem>> {
        let params = build_search_params(query)?;
        self.execute(&params)
    }

    pub fn try_lookup<I: AsRef<str>>(&self, item_ids: &[I], amazon_only: bool) -> Result<Vec<CatalogItem>> {
        self.execute(&build_lookup_params(item_ids, amazon_only))
    }

    /// Build the signed request for a search without performing it.
    pub fn build_search(&self, query: &SearchQuery) -> Result<HttpRequest> {
        let params = build_search_params(query)?;
        self.request_for(&params)
    }

    /// Build the signed request for a lookup without performing it.
    pub fn build_lookup<I: AsRef<str>>(&self, item_ids: &[I], amazon_only: bool) -> Result<HttpRequest> {
        self.request_for(&build_lookup_params(item_ids, amazon_only))
    }

    /// `build_search`, recording parameters and failures like `search`.
    pub fn prepare_search(&mut self, query: &SearchQuery) -> Option<HttpRequest> {
        let outcome = build_search_params(query).and_then(|params| self.prepare(params));
        self.settle(outcome)
    }

    /// `build_lookup`, recording parameters and failures like `lookup`.
    pub fn prepare_lookup<I: AsRef<str>>(&mut self, item_ids: &[I], amazon_only: bool) -> Option<HttpRequest> {
        let outcome = self.prepare(build_lookup_params(item_ids, amazon_only));
        self.settle(outcome)
    }

    /// Turn a response to a `build_*` request into catalog items.
    pub fn parse_items(&self, response: HttpResponse) -> Result<Vec<CatalogItem>> {
        check_status(&response)?;
        let doc = parse_document(&response.body)?;
        transform(&doc)
    }

    /// `parse_items` for the response to the latest `prepare_*` request.
    /// A failure is wrapped with that request's URL and recorded in the
    /// error log before it is returned.
    pub fn parse_prepared(&mut self, response: HttpResponse) -> Result<Vec<CatalogItem>> {
        let outcome = self.parse_items(response).map_err(|e| match &self.last_url {
            Some(url) => e.at_url(url),
            None => e,
        });
        if let Err(error) = &outcome {
            self.record_error(error);
        }
        outcome
    }

    fn request_for(&self, params: &RequestParameters) -> Result<HttpRequest> {
        Ok(HttpRequest::get(self.signer.generate(params)?))
    }

    fn prepare(&mut self, params: RequestParameters) -> Result<HttpRequest> {
        let request = self.request_for(&params);
        self.last_params = Some(params);
        self.last_url = request.as_ref().ok().map(|r| r.url.clone());
        request
    }

    fn run(&mut self, params: RequestParameters) -> Result<Vec<CatalogItem>> {
        let request = self.prepare(params)?;
        self.fetch(&request)
    }

    fn execute(&self, params: &RequestParameters) -> Result<Vec<CatalogItem>> {
        let request = self.request_for(params)?;
        self.fetch(&request)
    }

    fn fetch(&self, request: &HttpRequest) -> Result<Vec<CatalogItem>> {
        debug!(url = %request.url, "requesting catalog");
        self.fetcher
            .execute(request)
            .and_then(|response| self.parse_items(response))
            .map_err(|e| e.at_url(&request.url))
    }

    fn settle<T>(&mut self, outcome: Result<T>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(error) => {
                if matches!(error, CatalogError::PageOutOfRange { .. }) {
                    self.last_params = None;
                    self.last_url = None;
                }
                self.record_error(&error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::params::ParamValue;

    const SIGNED_URL: &str = "https://catalog.test/onca/xml?signed";

    const ONE_ITEM: &str = "<ItemSearchResponse><Items><Request><IsValid>True</IsValid></Request>\
        <Item><ASIN>B000X</ASIN><OfferSummary><LowestNewPrice><Amount>1999</Amount></LowestNewPrice></OfferSummary></Item>\
        </Items></ItemSearchResponse>";

    #[derive(Default)]
    struct RecordingSigner {
        calls: RefCell<Vec<RequestParameters>>,
    }

    impl RequestSigner for &RecordingSigner {
        fn generate(&self, params: &RequestParameters) -> Result<String> {
            self.calls.borrow_mut().push(params.clone());
            Ok(SIGNED_URL.to_string())
        }
    }

    struct CannedFetcher {
        reply: std::result::Result<(u16, &'static str), &'static str>,
        calls: Cell<usize>,
    }

    impl CannedFetcher {
        fn ok(body: &'static str) -> Self {
            Self::status(200, body)
        }

        fn status(status: u16, body: &'static str) -> Self {
            Self {
                reply: Ok((status, body)),
                calls: Cell::new(0),
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                reply: Err(message),
                calls: Cell::new(0),
            }
        }
    }

    impl HttpFetcher for &CannedFetcher {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
            assert_eq!(request.url, SIGNED_URL);
            self.calls.set(self.calls.get() + 1);
            match self.reply {
                Ok((status, body)) => Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                }),
                Err(message) => Err(CatalogError::Transport(message.to_string())),
            }
        }
    }

    #[test]
    fn search_returns_items_without_logging() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::ok(ONE_ITEM);
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        let items = client.search(&SearchQuery::new().category("Books").keywords("rust")).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].lowest_price.to_string(), "19.99");
        assert!(client.errors().is_empty());
        assert_eq!(
            client.last_params().and_then(|p| p.get("Keywords")),
            Some(&ParamValue::Text("rust".to_string()))
        );
    }

    #[test]
    fn page_out_of_range_never_reaches_the_network() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::ok(ONE_ITEM);
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        assert_eq!(client.search(&SearchQuery::new().page(6)), None);
        assert_eq!(client.search(&SearchQuery::new().category("Baby").page(11)), None);

        assert!(signer.calls.borrow().is_empty());
        assert_eq!(fetcher.calls.get(), 0);
        assert_eq!(
            client.errors(),
            &[
                "Page must be <= 10, Unless SearchIndex is All then it must be <= 5".to_string(),
                "Page must be <= 10, Unless SearchIndex is All then it must be <= 5".to_string(),
            ]
        );
        assert!(client.last_params().is_none());
    }

    #[test]
    fn transport_failure_is_logged_with_url() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::failing("connection refused");
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        assert_eq!(client.lookup(&["B000X"], false), None);
        assert_eq!(
            client.errors(),
            &[format!("Error downloading data : {SIGNED_URL} : transport failure: connection refused")]
        );
        assert!(client.last_params().is_some());
    }

    #[test]
    fn api_error_is_logged_with_url() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::ok(
            "<ItemLookupResponse><Items><Request><IsValid>False</IsValid>\
             <Errors><Error><Code>AWS.InvalidParameterValue</Code><Message>B000Z is not valid</Message></Error></Errors>\
             </Request></Items></ItemLookupResponse>",
        );
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        assert_eq!(client.lookup(&["B000Z"], false), None);
        assert_eq!(client.errors().len(), 1);
        let logged = &client.errors()[0];
        assert!(logged.starts_with(&format!("Error downloading data : {SIGNED_URL} : ")));
        assert!(logged.ends_with("API ERROR (AWS.InvalidParameterValue) : B000Z is not valid"));
    }

    #[test]
    fn parse_failure_is_logged() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::ok("<Items><Item>");
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        assert_eq!(client.search(&SearchQuery::new()), None);
        assert_eq!(client.errors().len(), 1);
        assert!(client.errors()[0].contains("XML parse failed"));
    }

    #[test]
    fn http_error_status_is_logged() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::status(403, "forbidden");
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        assert_eq!(client.search(&SearchQuery::new()), None);
        assert_eq!(
            client.errors(),
            &[format!("Error downloading data : {SIGNED_URL} : HTTP 403: forbidden")]
        );
    }

    #[test]
    fn errors_accumulate_across_calls() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::ok("");
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        client.search(&SearchQuery::new());
        client.lookup(&["B000X"], true);
        assert_eq!(client.errors().len(), 2);
        assert!(client.errors().iter().all(|e| e.ends_with("No XML response found from AWS.")));
    }

    #[test]
    fn repeated_search_is_idempotent() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::ok(ONE_ITEM);
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        let query = SearchQuery::new().category("Electronics").page(2);
        let first = client.search(&query);
        let second = client.search(&query);
        assert!(first.is_some());
        assert_eq!(first, second);
        assert!(client.errors().is_empty());
        assert_eq!(fetcher.calls.get(), 2);
        let calls = signer.calls.borrow();
        assert_eq!(calls[0], calls[1]);
    }

    #[test]
    fn lookup_sends_joined_identifiers() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::ok(ONE_ITEM);
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        client.lookup(&["B000X", "B000Y"], false).unwrap();
        assert_eq!(
            signer.calls.borrow()[0].get("ItemId"),
            Some(&ParamValue::Text("B000X,B000Y".to_string()))
        );
    }

    #[test]
    fn try_variants_leave_log_untouched() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::failing("timed out");
        let client = CatalogClient::with_parts(&signer, &fetcher);

        let err = client.try_search(&SearchQuery::new().page(9)).unwrap_err();
        assert!(matches!(err, CatalogError::PageOutOfRange { page: 9, max: 5 }));

        let err = client.try_lookup(&["B000X"], false).unwrap_err();
        assert!(matches!(err.root(), CatalogError::Transport(_)));
        assert!(client.errors().is_empty());
        assert!(client.last_params().is_none());
    }

    #[test]
    fn build_and_parse_split() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::ok(ONE_ITEM);
        let client = CatalogClient::with_parts(&signer, &fetcher);

        let req = client.build_search(&SearchQuery::new().keywords("lamp")).unwrap();
        assert_eq!(req.url, SIGNED_URL);
        assert_eq!(fetcher.calls.get(), 0);

        let items = client
            .parse_items(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: ONE_ITEM.to_string(),
            })
            .unwrap();
        assert_eq!(items[0].asin, "B000X");

        assert!(client.build_search(&SearchQuery::new().page(99)).is_err());
        assert!(client.build_lookup(&["B000X"], true).is_ok());
    }

    #[test]
    fn prepare_keeps_params_and_logs_failures() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::ok(ONE_ITEM);
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        let req = client.prepare_lookup(&["B000X"], true).unwrap();
        assert_eq!(req.url, SIGNED_URL);
        assert_eq!(
            client.last_params().and_then(|p| p.get("MerchantId")),
            Some(&ParamValue::Text("Amazon".to_string()))
        );

        assert_eq!(client.last_url(), Some(SIGNED_URL));

        assert_eq!(client.prepare_search(&SearchQuery::new().page(7)), None);
        assert!(client.last_params().is_none());
        assert!(client.last_url().is_none());
        assert_eq!(client.errors().len(), 1);
        assert_eq!(fetcher.calls.get(), 0);
    }

    #[test]
    fn parse_prepared_logs_failures_with_the_prepared_url() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::ok(ONE_ITEM);
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        client.prepare_lookup(&["B000Z"], false).unwrap();
        let err = client
            .parse_prepared(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: "<ItemLookupResponse><Items><Request><IsValid>False</IsValid>\
                       <Errors><Error><Code>X</Code><Message>Y</Message></Error></Errors>\
                       </Request></Items></ItemLookupResponse>"
                    .to_string(),
            })
            .unwrap_err();

        assert!(matches!(err.root(), CatalogError::Api { code, .. } if code == "X"));
        assert_eq!(
            client.errors(),
            &[format!("Error downloading data : {SIGNED_URL} : API ERROR (X) : Y")]
        );

        let items = client
            .parse_prepared(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: ONE_ITEM.to_string(),
            })
            .unwrap();
        assert_eq!(items[0].asin, "B000X");
        assert_eq!(client.errors().len(), 1);
    }

    #[test]
    fn parse_prepared_without_a_prepared_request_logs_bare_error() {
        let signer = RecordingSigner::default();
        let fetcher = CannedFetcher::ok(ONE_ITEM);
        let mut client = CatalogClient::with_parts(&signer, &fetcher);

        let response = HttpResponse {
            status: 503,
            headers: Vec::new(),
            body: "busy".to_string(),
        };
        assert!(client.parse_prepared(response).is_err());
        assert_eq!(client.errors(), &["HTTP 503: busy".to_string()]);
    }
}
