//! Drive the C ABI against the live mock server, with ureq standing in for
//! the host's HTTP stack.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use catalog_ffi::types::{FfiErrorCode, FfiHttpRequest, FfiHttpResponse};
use catalog_ffi::*;

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn read(ptr: *const c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
}

/// Perform the GET described by `req` and return the status and body.
fn execute(req: *mut FfiHttpRequest) -> (u16, CString) {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let url = read(unsafe { &*req }.url);
    let mut response = agent.get(&url).call().expect("HTTP transport error");
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    catalog_free_request(req);
    (status, CString::new(body).unwrap())
}

#[test]
fn search_then_lookup_over_c_abi() {
    let base_url = CString::new(start_server()).unwrap();
    let access = CString::new("AKIDEXAMPLE").unwrap();
    let secret = CString::new("secret").unwrap();
    let region = CString::new("US").unwrap();
    let client = catalog_client_new(
        access.as_ptr(),
        secret.as_ptr(),
        std::ptr::null(),
        region.as_ptr(),
        base_url.as_ptr(),
    );
    assert!(!client.is_null());

    // Step 1: search Electronics for a charger.
    let category = CString::new("Electronics").unwrap();
    let keywords = CString::new("charger").unwrap();
    let req = catalog_build_search(
        client,
        category.as_ptr(),
        &1,
        keywords.as_ptr(),
        std::ptr::null(),
        std::ptr::null(),
        std::ptr::null(),
    );
    assert!(!req.is_null());
    let (status, body) = execute(req);
    let resp = FfiHttpResponse {
        status,
        body: body.as_ptr(),
    };
    let result = catalog_parse_items(client, &resp);
    let result_ref = unsafe { &*result };
    assert_eq!(result_ref.error_code, FfiErrorCode::Ok);
    assert_eq!(result_ref.items_len, 1);
    let item = unsafe { &*result_ref.items };
    assert_eq!(read(item.asin), "B00CHARGER");
    assert_eq!(read(item.lowest_price), "19.99");
    assert!(item.available);
    assert!(item.prime);
    assert_eq!(read(item.binding), "Electronics");
    assert_eq!(read(item.details), "65 W output foldable plug");
    catalog_free_result(result);

    // Step 2: a lookup with an unknown id fails in-band and is logged.
    let ids = CString::new("B00KETTLE1,B000NOPE").unwrap();
    let req = catalog_build_lookup(client, ids.as_ptr(), false);
    let (status, body) = execute(req);
    assert_eq!(status, 200);
    let resp = FfiHttpResponse {
        status,
        body: body.as_ptr(),
    };
    let result = catalog_parse_items(client, &resp);
    let result_ref = unsafe { &*result };
    assert_eq!(result_ref.error_code, FfiErrorCode::Api);
    let message = read(result_ref.error_message);
    assert!(message.starts_with(&format!("Error downloading data : {}/onca/xml?", read(base_url.as_ptr()))), "{message}");
    assert!(message.contains(" : API ERROR (AWS.InvalidParameterValue) : B000NOPE"), "{message}");
    catalog_free_result(result);

    let errors_ptr = catalog_errors_json(client);
    let errors: Vec<String> = serde_json::from_str(&read(errors_ptr)).unwrap();
    catalog_free_string(errors_ptr);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0], message);

    let params_ptr = catalog_last_params_json(client);
    let params: serde_json::Value = serde_json::from_str(&read(params_ptr)).unwrap();
    catalog_free_string(params_ptr);
    assert_eq!(params["ItemId"], "B00KETTLE1,B000NOPE");

    catalog_client_free(client);
}
