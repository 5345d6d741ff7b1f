//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length pairs instead of
//! `Vec`, and enums with explicit discriminants. Conversion and release
//! helpers live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use catalog_core::{CatalogClient, CatalogError, CatalogItem, HttpRequest};

/// Opaque handle to a `CatalogClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiCatalogClient {
    pub(crate) inner: CatalogClient,
}

// ---------------------------------------------------------------------------
// Allocation helpers
// ---------------------------------------------------------------------------

/// Move `s` onto the C heap. Interior NULs are dropped.
pub(crate) fn c_string(s: String) -> *mut c_char {
    let bytes: Vec<u8> = s.into_bytes().into_iter().filter(|b| *b != 0).collect();
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// `c_string` for an optional value; `None` becomes null.
fn c_string_opt(s: Option<String>) -> *mut c_char {
    s.map(c_string).unwrap_or(std::ptr::null_mut())
}

/// Release a string produced by `c_string`. Null is ignored.
pub(crate) unsafe fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Hand a vector to C as a pointer + length. An empty vector is null.
/// Lengths are `u32` on the C side; elements past `u32::MAX` are dropped
/// so the pointer and length always describe the same allocation.
fn into_raw_array<T>(mut items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = u32::try_from(items.len()).unwrap_or(u32::MAX);
    items.truncate(len as usize);
    (Box::into_raw(items.into_boxed_slice()) as *mut T, len)
}

/// Take back an array produced by `into_raw_array`.
unsafe fn from_raw_array<T>(ptr: *mut T, len: u32) -> Box<[T]> {
    if ptr.is_null() || len == 0 {
        return Box::default();
    }
    unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len as usize)) }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A signed GET request described as C-compatible plain data.
///
/// Built by `catalog_build_*` functions. The C caller executes the request
/// and passes the response back through `catalog_parse_items`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_array(headers);

        Box::into_raw(Box::new(FfiHttpRequest {
            url: c_string(req.url),
            headers,
            headers_len,
        }))
    }

    /// Release a request produced by `from_core`.
    pub(crate) unsafe fn free(req: *mut Self) {
        let req = unsafe { Box::from_raw(req) };
        unsafe { free_c_string(req.url) };
        for header in unsafe { from_raw_array(req.headers, req.headers_len) }.iter() {
            unsafe {
                free_c_string(header.key);
                free_c_string(header.value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this after executing the request, then passes a
/// pointer to `catalog_parse_items`. The FFI layer reads but does not free
/// these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiCatalogResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Validation = 1,
    Transport = 2,
    Http = 3,
    Parse = 4,
    EmptyResponse = 5,
    Api = 6,
    Signing = 7,
    Config = 8,
    Panic = 9,
    NullArg = 10,
}

impl From<&CatalogError> for FfiErrorCode {
    fn from(err: &CatalogError) -> Self {
        match err {
            CatalogError::PageOutOfRange { .. } => FfiErrorCode::Validation,
            CatalogError::Transport(_) => FfiErrorCode::Transport,
            CatalogError::HttpStatus { .. } => FfiErrorCode::Http,
            CatalogError::Parse(_) => FfiErrorCode::Parse,
            CatalogError::EmptyResponse => FfiErrorCode::EmptyResponse,
            CatalogError::Api { .. } => FfiErrorCode::Api,
            CatalogError::Signing(_) => FfiErrorCode::Signing,
            CatalogError::Config(_) => FfiErrorCode::Config,
            CatalogError::Download { source, .. } => source.as_ref().into(),
        }
    }
}

/// One catalog item exposed to C.
///
/// Prices are decimal strings such as `"19.99"`. `binding` and
/// `manufacturer` are null when the response did not carry them.
#[repr(C)]
pub struct FfiCatalogItem {
    pub asin: *mut c_char,
    pub url: *mut c_char,
    pub list_price: *mut c_char,
    pub lowest_price: *mut c_char,
    pub title: *mut c_char,
    pub available: bool,
    pub prime: bool,
    pub is_adult_product: bool,
    pub large_image: *mut c_char,
    pub medium_image: *mut c_char,
    pub small_image: *mut c_char,
    pub description: *mut c_char,
    pub features: *mut *mut c_char,
    pub features_len: u32,
    pub details: *mut c_char,
    pub binding: *mut c_char,
    pub manufacturer: *mut c_char,
}

impl FfiCatalogItem {
    fn from_core(item: CatalogItem) -> Self {
        let [binding, manufacturer] = item.tags;
        let (features, features_len) = into_raw_array(item.features.into_iter().map(c_string).collect());
        FfiCatalogItem {
            asin: c_string(item.asin),
            url: c_string(item.url),
            list_price: c_string(item.list_price.to_string()),
            lowest_price: c_string(item.lowest_price.to_string()),
            title: c_string(item.title),
            available: item.available,
            prime: item.prime,
            is_adult_product: item.is_adult_product,
            large_image: c_string(item.large_image),
            medium_image: c_string(item.medium_image),
            small_image: c_string(item.small_image),
            description: c_string(item.description),
            features,
            features_len,
            details: c_string(item.details),
            binding: c_string_opt(binding),
            manufacturer: c_string_opt(manufacturer),
        }
    }

    /// Free the fields of an item (but not the struct itself).
    unsafe fn free_fields(&self) {
        for s in [
            self.asin,
            self.url,
            self.list_price,
            self.lowest_price,
            self.title,
            self.large_image,
            self.medium_image,
            self.small_image,
            self.description,
            self.details,
            self.binding,
            self.manufacturer,
        ] {
            unsafe { free_c_string(s) };
        }
        for feature in unsafe { from_raw_array(self.features, self.features_len) }.iter() {
            unsafe { free_c_string(*feature) };
        }
    }
}

/// Result envelope for `catalog_parse_items`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `items`
/// holds `items_len` records (null when there are none).
/// On failure `error_code` describes the category, `error_message` is the
/// same text that was appended to the client's error log, and `items` is
/// null. `http_status` is set for `Http` failures.
#[repr(C)]
pub struct FfiCatalogResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub items: *mut FfiCatalogItem,
    pub items_len: u32,
}

impl FfiCatalogResult {
    pub(crate) fn ok(items: Vec<CatalogItem>) -> *mut Self {
        let (items, items_len) = into_raw_array(items.into_iter().map(FfiCatalogItem::from_core).collect());
        Box::into_raw(Box::new(FfiCatalogResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            items,
            items_len,
        }))
    }

    pub(crate) fn from_error(err: &CatalogError) -> *mut Self {
        let http_status = match err.root() {
            CatalogError::HttpStatus { status, .. } => *status,
            _ => 0,
        };
        Self::failure(err.into(), err.to_string(), http_status)
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}"), 0)
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg.to_string(), 0)
    }

    fn failure(error_code: FfiErrorCode, message: String, http_status: u16) -> *mut Self {
        Box::into_raw(Box::new(FfiCatalogResult {
            error_code,
            error_message: c_string(message),
            http_status,
            items: std::ptr::null_mut(),
            items_len: 0,
        }))
    }

    /// Release a result produced by this module.
    pub(crate) unsafe fn free(result: *mut Self) {
        let result = unsafe { Box::from_raw(result) };
        unsafe { free_c_string(result.error_message) };
        for item in unsafe { from_raw_array(result.items, result.items_len) }.iter() {
            unsafe { item.free_fields() };
        }
    }
}
