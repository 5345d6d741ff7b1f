//! C-ABI wrapper around `catalog-core`.
//!
//! # Overview
//! Exposes catalog search and lookup through `extern "C"` functions so any
//! language with a C FFI can build signed requests and turn XML responses
//! into catalog items while keeping the HTTP round-trip on its own side.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `catalog_build_*` return a signed GET request; the host executes it and
//!   hands the response to `catalog_parse_items`.
//! - Failures are appended to the client's error log exactly as the core
//!   `search` / `lookup` would; `catalog_errors_json` and
//!   `catalog_last_params_json` expose the log and the latest parameters.
//! - The C caller owns all returned pointers and must call the matching
//!   `catalog_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use catalog_core::{CatalogClient, ClientConfig, HttpResponse, Region, SearchQuery};

use types::*;

/// Borrow a C string. Null and invalid UTF-8 both read as `None`.
fn opt_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `CatalogClient`.
///
/// `access_key` and `secret_key` are required. `associate_tag` and `region`
/// fall back to their defaults when null; `endpoint` (e.g.
/// `http://127.0.0.1:3000`) replaces the regional host when non-null.
/// Returns null if a required argument is null, `region` is not a known
/// region code, or an internal panic occurs. The caller must free the
/// returned pointer with `catalog_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_client_new(
    access_key: *const c_char,
    secret_key: *const c_char,
    associate_tag: *const c_char,
    region: *const c_char,
    endpoint: *const c_char,
) -> *mut FfiCatalogClient {
    catch_unwind(|| {
        let (Some(access_key), Some(secret_key)) = (opt_str(access_key), opt_str(secret_key)) else {
            return std::ptr::null_mut();
        };
        let region = match opt_str(region).map(str::parse::<Region>) {
            None => Region::default(),
            Some(Ok(region)) => region,
            Some(Err(_)) => return std::ptr::null_mut(),
        };

        let mut config = ClientConfig::new(access_key, secret_key, region);
        if let Some(tag) = opt_str(associate_tag) {
            config = config.with_associate_tag(tag);
        }
        if let Some(endpoint) = opt_str(endpoint) {
            config = config.with_endpoint(endpoint);
        }
        let client = CatalogClient::new(&config);
        Box::into_raw(Box::new(FfiCatalogClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `catalog_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_client_free(client: *mut FfiCatalogClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the signed request for an item search.
///
/// Every pointer argument may be null: `category` searches all departments,
/// `page` leaves the page unset, `keywords` is omitted, `sort_by` uses
/// `salesrank` (pass `""` for no sort), `availability` uses `Available`,
/// `condition` uses `New`. A page below 1 is sent as 1.
///
/// Returns null if `client` is null or the page is out of range; the latter
/// is recorded in the client's error log. The caller must free the returned
/// pointer with `catalog_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_build_search(
    client: *mut FfiCatalogClient,
    category: *const c_char,
    page: *const i64,
    keywords: *const c_char,
    sort_by: *const c_char,
    availability: *const c_char,
    condition: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &mut *client };

        let mut query = SearchQuery::new();
        query.category = opt_str(category).map(str::to_string);
        query.page = (!page.is_null()).then(|| unsafe { *page });
        query.keywords = opt_str(keywords).map(str::to_string);
        if let Some(sort) = opt_str(sort_by) {
            query = query.sort_by(sort);
        }
        if let Some(availability) = opt_str(availability) {
            query = query.availability(availability);
        }
        if let Some(condition) = opt_str(condition) {
            query = query.condition(condition);
        }

        match client.inner.prepare_search(&query) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Build the signed request for an item lookup.
///
/// `item_ids` is a comma-separated list of item identifiers. With
/// `amazon_only`, offers are restricted to Amazon as the merchant.
/// Returns null if `client` or `item_ids` is null. The caller must free the
/// returned pointer with `catalog_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_build_lookup(
    client: *mut FfiCatalogClient,
    item_ids: *const c_char,
    amazon_only: bool,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(item_ids) = opt_str(item_ids) else {
            return std::ptr::null_mut();
        };
        let client = unsafe { &mut *client };
        let ids: Vec<&str> = item_ids.split(',').map(str::trim).filter(|id| !id.is_empty()).collect();
        match client.inner.prepare_lookup(&ids, amazon_only) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response function
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is an
/// empty body.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: opt_str(resp.body).unwrap_or_default().to_string(),
    }
}

/// Turn the response to a `catalog_build_*` request into catalog items.
///
/// Failures are wrapped with the URL of the latest `catalog_build_*`
/// request, recorded in the client's error log and reported in the
/// returned envelope. The caller must free the result with
/// `catalog_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_parse_items(
    client: *mut FfiCatalogClient,
    response: *const FfiHttpResponse,
) -> *mut FfiCatalogResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiCatalogResult::null_arg("client");
        }
        if response.is_null() {
            return FfiCatalogResult::null_arg("response");
        }
        let client = unsafe { &mut *client };
        let resp = unsafe { &*response };
        match client.inner.parse_prepared(ffi_response_to_core(resp)) {
            Ok(items) => FfiCatalogResult::ok(items),
            Err(e) => FfiCatalogResult::from_error(&e),
        }
    }))
    .unwrap_or_else(|_| FfiCatalogResult::panic("panic in catalog_parse_items"))
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// The client's error log as a JSON array of strings, oldest first.
///
/// Returns null if `client` is null. Free with `catalog_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_errors_json(client: *const FfiCatalogClient) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match serde_json::to_string(client.inner.errors()) {
            Ok(json) => c_string(json),
            Err(_) => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Parameters of the latest build that got past validation, as a JSON
/// object, or `null` when there are none.
///
/// Returns null if `client` is null. Free with `catalog_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_last_params_json(client: *const FfiCatalogClient) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match serde_json::to_string(&client.inner.last_params()) {
            Ok(json) => c_string(json),
            Err(_) => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `catalog_build_*`. Safe to call
/// with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiHttpRequest::free(req) });
}

/// Free an `FfiCatalogResult` returned by `catalog_parse_items`. Safe to
/// call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_result(result: *mut FfiCatalogResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiCatalogResult::free(result) });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn catalog_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| unsafe { free_c_string(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
