//! C-ABI wrapper around `hoebiyoung-core`.
//!
//! # Overview
//! Exposes the QR rental, return and student-fee flows through `extern "C"`
//! functions so the mobile host can build and parse HTTP requests/responses
//! without linking to serde directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `build_*` / `parse_*` mirrors the core API 1:1.
//! - A single `FfiResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `hby_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use hoebiyoung_core::api::auth::LoginRequest;
use hoebiyoung_core::{normalize_rental_qr_payload, CouncilClient, HttpRequest, HttpResponse};

use types::*;

/// Borrow a caller string. Invalid UTF-8 reads as empty.
///
/// # Safety
/// `p` must be non-null, NUL-terminated, and stay valid and unmodified for
/// `'a`.
unsafe fn c_str<'a>(p: *const c_char) -> &'a str {
    unsafe { CStr::from_ptr(p) }.to_str().unwrap_or("")
}

/// Run a builder against the client, returning null on a null client, a
/// rejected input, or a panic.
fn build_with<F>(client: *const FfiCouncilClient, f: F) -> *mut FfiHttpRequest
where
    F: FnOnce(&CouncilClient) -> Option<HttpRequest>,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match f(&client.inner) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Drop a rejected build, leaving a trace for the host's log sink.
fn logged<E: std::fmt::Display>(op: &str, built: Result<HttpRequest, E>) -> Option<HttpRequest> {
    built
        .map_err(|err| tracing::warn!(op, error = %err, "request not built"))
        .ok()
}

/// Null-check both handles, convert the response, and hand both to `f`.
fn parse_with<F>(client: *const FfiCouncilClient, response: *const FfiHttpResponse, name: &str, f: F) -> *mut FfiResult
where
    F: FnOnce(&CouncilClient, HttpResponse) -> *mut FfiResult,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        f(&client.inner, ffi_response_to_core(resp))
    }))
    .unwrap_or_else(|_| FfiResult::panic(&format!("panic in {name}")))
}

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body reads
/// as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() { "" } else { unsafe { c_str(resp.body) } };
    HttpResponse::new(resp.status, body)
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `CouncilClient` bound to `base_url`.
///
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `hby_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hby_client_new(base_url: *const c_char) -> *mut FfiCouncilClient {
    catch_unwind(|| {
        if base_url.is_null() {
            return std::ptr::null_mut();
        }
        let client = CouncilClient::new(unsafe { c_str(base_url) });
        Box::into_raw(Box::new(FfiCouncilClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a `CouncilClient` created by `hby_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hby_client_free(client: *mut FfiCouncilClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

/// Set the bearer token sent with every request. Null or empty clears it.
#[unsafe(no_mangle)]
pub extern "C" fn hby_client_set_auth_token(client: *mut FfiCouncilClient, token: *const c_char) {
    if client.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let client = unsafe { &mut *client };
        let token = if token.is_null() { None } else { Some(unsafe { c_str(token) }) };
        client.inner.set_auth_token(token.filter(|t| !t.is_empty()));
    }));
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build a login request. Returns null if any argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn hby_build_login(
    client: *const FfiCouncilClient,
    email: *const c_char,
    password: *const c_char,
) -> *mut FfiHttpRequest {
    if email.is_null() || password.is_null() {
        return std::ptr::null_mut();
    }
    build_with(client, |c| {
        let payload = LoginRequest {
            email: unsafe { c_str(email) }.to_string(),
            password: unsafe { c_str(password) }.to_string(),
        };
        logged("hby_build_login", c.build_login(&payload))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn hby_build_logout(client: *const FfiCouncilClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_logout()))
}

/// Build a request for a rental QR token for `item_category_id`.
#[unsafe(no_mangle)]
pub extern "C" fn hby_build_generate_rental_qr_token(
    client: *const FfiCouncilClient,
    item_category_id: i64,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_generate_rental_qr_token(item_category_id)))
}

/// Build a request for a return QR token for `rental_history_id`.
#[unsafe(no_mangle)]
pub extern "C" fn hby_build_generate_return_qr_token(
    client: *const FfiCouncilClient,
    rental_history_id: i64,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_generate_return_qr_token(rental_history_id)))
}

#[unsafe(no_mangle)]
pub extern "C" fn hby_build_member_blacklist(client: *const FfiCouncilClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_member_blacklist()))
}

#[unsafe(no_mangle)]
pub extern "C" fn hby_build_generate_student_fee_qr_token(client: *const FfiCouncilClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_generate_student_fee_qr_token()))
}

/// Build a council-side fee check. Returns null if `qr_token` is null or empty.
#[unsafe(no_mangle)]
pub extern "C" fn hby_build_verify_student_fee(
    client: *const FfiCouncilClient,
    qr_token: *const c_char,
) -> *mut FfiHttpRequest {
    if qr_token.is_null() {
        return std::ptr::null_mut();
    }
    build_with(client, |c| {
        let qr_token = unsafe { c_str(qr_token) };
        logged("hby_build_verify_student_fee", c.build_verify_student_fee(qr_token))
    })
}

/// Build a rent request from raw scanned text. Returns null if the scan
/// holds no token.
#[unsafe(no_mangle)]
pub extern "C" fn hby_build_rent_item_by_qr(client: *const FfiCouncilClient, raw: *const c_char) -> *mut FfiHttpRequest {
    if raw.is_null() {
        return std::ptr::null_mut();
    }
    build_with(client, |c| {
        let raw = unsafe { c_str(raw) };
        logged("hby_build_rent_item_by_qr", c.build_rent_item_by_qr(raw))
    })
}

/// Build a return request from raw scanned text. Returns null if the scan
/// holds no token.
#[unsafe(no_mangle)]
pub extern "C" fn hby_build_return_item_by_qr(
    client: *const FfiCouncilClient,
    raw: *const c_char,
) -> *mut FfiHttpRequest {
    if raw.is_null() {
        return std::ptr::null_mut();
    }
    build_with(client, |c| {
        let raw = unsafe { c_str(raw) };
        logged("hby_build_return_item_by_qr", c.build_return_item_by_qr(raw))
    })
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Returns a result with `data_tag = Login` on success.
#[unsafe(no_mangle)]
pub extern "C" fn hby_parse_login(
    client: *const FfiCouncilClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "hby_parse_login", |c, resp| match c.parse_login(resp) {
        Ok(login) => FfiResult::ok_login(login),
        Err(e) => FfiResult::from_error(e),
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn hby_parse_logout(
    client: *const FfiCouncilClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "hby_parse_logout", |c, resp| match c.parse_logout(resp) {
        Ok(()) => FfiResult::ok_empty(),
        Err(e) => FfiResult::from_error(e),
    })
}

/// Returns a result with `data_tag = QrToken` on success.
#[unsafe(no_mangle)]
pub extern "C" fn hby_parse_generate_rental_qr_token(
    client: *const FfiCouncilClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "hby_parse_generate_rental_qr_token", |c, resp| {
        match c.parse_generate_rental_qr_token(resp) {
            Ok(token) => FfiResult::ok_qr_token(token.qr_token, token.student_fee_paid),
            Err(e) => FfiResult::from_error(e),
        }
    })
}

/// Returns a result with `data_tag = QrToken` on success.
#[unsafe(no_mangle)]
pub extern "C" fn hby_parse_generate_return_qr_token(
    client: *const FfiCouncilClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "hby_parse_generate_return_qr_token", |c, resp| {
        match c.parse_generate_return_qr_token(resp) {
            Ok(token) => FfiResult::ok_qr_token(token.qr_token, token.student_fee_paid),
            Err(e) => FfiResult::from_error(e),
        }
    })
}

/// Returns a result with `data_tag = Blacklist` on success.
#[unsafe(no_mangle)]
pub extern "C" fn hby_parse_member_blacklist(
    client: *const FfiCouncilClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "hby_parse_member_blacklist", |c, resp| {
        match c.parse_member_blacklist(resp) {
            Ok(info) => FfiResult::ok_blacklist(info),
            Err(e) => FfiResult::from_error(e),
        }
    })
}

/// Returns a result with `data_tag = QrToken` on success.
#[unsafe(no_mangle)]
pub extern "C" fn hby_parse_generate_student_fee_qr_token(
    client: *const FfiCouncilClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "hby_parse_generate_student_fee_qr_token", |c, resp| {
        match c.parse_generate_student_fee_qr_token(resp) {
            Ok(token) => FfiResult::ok_qr_token(token.qr_token, token.fee_paid),
            Err(e) => FfiResult::from_error(e),
        }
    })
}

/// Returns a result with `data_tag = Approval` on success.
#[unsafe(no_mangle)]
pub extern "C" fn hby_parse_verify_student_fee(
    client: *const FfiCouncilClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "hby_parse_verify_student_fee", |c, resp| {
        match c.parse_verify_student_fee(resp) {
            Ok(approved) => FfiResult::ok_approval(approved),
            Err(e) => FfiResult::from_error(e),
        }
    })
}

/// A refusal comes back as `error_code = Rental` with `rental_code` set
/// when the server's code is recognized.
#[unsafe(no_mangle)]
pub extern "C" fn hby_parse_rent_item_by_qr(
    client: *const FfiCouncilClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "hby_parse_rent_item_by_qr", |c, resp| {
        match c.parse_rent_item_by_qr(resp) {
            Ok(()) => FfiResult::ok_empty(),
            Err(e) => FfiResult::from_rental_error(e),
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn hby_parse_return_item_by_qr(
    client: *const FfiCouncilClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "hby_parse_return_item_by_qr", |c, resp| {
        match c.parse_return_item_by_qr(resp) {
            Ok(()) => FfiResult::ok_empty(),
            Err(e) => FfiResult::from_rental_error(e),
        }
    })
}

/// Decode raw scanned text. Returns a result with `data_tag = QrPayload`;
/// only a null `raw` fails.
#[unsafe(no_mangle)]
pub extern "C" fn hby_normalize_rental_qr_payload(raw: *const c_char) -> *mut FfiResult {
    catch_unwind(|| {
        if raw.is_null() {
            return FfiResult::null_arg("raw");
        }
        FfiResult::ok_qr_payload(normalize_rental_qr_payload(unsafe { c_str(raw) }))
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in hby_normalize_rental_qr_payload"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `hby_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hby_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        drop_c_string(req.url);
        drop_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                drop_c_string(h.key);
                drop_c_string(h.value);
            }
        }
    });
}

/// Free an `FfiResult` returned by any `hby_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn hby_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        drop_c_string(result.error_message);
        drop_c_string(result.rental_code);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::QrToken => {
                let token = unsafe { Box::from_raw(result.data as *mut FfiQrToken) };
                drop_c_string(token.qr_token);
            }
            FfiDataTag::Blacklist => {
                let info = unsafe { Box::from_raw(result.data as *mut FfiBlacklist) };
                drop_c_string(info.blacklist_until);
            }
            FfiDataTag::Approval => {
                drop(unsafe { Box::from_raw(result.data as *mut FfiApproval) });
            }
            FfiDataTag::QrPayload => {
                let payload = unsafe { Box::from_raw(result.data as *mut FfiQrPayload) };
                drop_c_string(payload.qr_token);
            }
            FfiDataTag::Login => {
                let login = unsafe { Box::from_raw(result.data as *mut FfiLogin) };
                drop_c_string(login.role);
                drop_c_string(login.access_token);
                drop_c_string(login.refresh_token);
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hby_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| drop_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn new_client() -> *mut FfiCouncilClient {
        let url = CString::new("http://localhost:3000").unwrap();
        hby_client_new(url.as_ptr())
    }

    fn read(p: *const c_char) -> String {
        unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string()
    }

    fn header(req: &FfiHttpRequest, name: &str) -> Option<String> {
        let headers = unsafe { std::slice::from_raw_parts(req.headers, req.headers_len as usize) };
        headers
            .iter()
            .find(|h| read(h.key).eq_ignore_ascii_case(name))
            .map(|h| read(h.value))
    }

    #[test]
    fn client_new_and_free() {
        let client = new_client();
        assert!(!client.is_null());
        hby_client_free(client);
    }

    #[test]
    fn client_new_null_returns_null() {
        let client = hby_client_new(std::ptr::null());
        assert!(client.is_null());
    }

    #[test]
    fn client_free_null_is_safe() {
        hby_client_free(std::ptr::null_mut());
    }

    #[test]
    fn build_rental_qr_token_request() {
        let client = new_client();
        let req = hby_build_generate_rental_qr_token(client, 5);
        assert!(!req.is_null());

        let req_ref = unsafe { &*req };
        assert_eq!(req_ref.method, FfiHttpMethod::Get);
        assert_eq!(read(req_ref.url), "http://localhost:3000/rentals/5/qr-tokens");
        assert!(req_ref.body.is_null());
        assert_eq!(req_ref.timeout_ms, 10_000);
        assert!(header(req_ref, "authorization").is_none());

        hby_free_request(req);
        hby_client_free(client);
    }

    #[test]
    fn auth_token_is_attached_then_cleared() {
        let client = new_client();
        let token = CString::new("abc").unwrap();
        hby_client_set_auth_token(client, token.as_ptr());

        let req = hby_build_member_blacklist(client);
        assert_eq!(header(unsafe { &*req }, "authorization").as_deref(), Some("Bearer abc"));
        hby_free_request(req);

        hby_client_set_auth_token(client, std::ptr::null());
        let req = hby_build_member_blacklist(client);
        assert!(header(unsafe { &*req }, "authorization").is_none());
        hby_free_request(req);
        hby_client_free(client);
    }

    #[test]
    fn build_login_null_client_returns_null() {
        let email = CString::new("a@b").unwrap();
        let req = hby_build_login(std::ptr::null(), email.as_ptr(), email.as_ptr());
        assert!(req.is_null());
    }

    #[test]
    fn build_rent_by_qr_carries_category_hint() {
        let client = new_client();
        let raw = CString::new(r#"{"qrToken":"tok","itemCategoryId":3}"#).unwrap();
        let req = hby_build_rent_item_by_qr(client, raw.as_ptr());
        assert!(!req.is_null());

        let req_ref = unsafe { &*req };
        assert_eq!(req_ref.method, FfiHttpMethod::Post);
        assert_eq!(read(req_ref.url), "http://localhost:3000/admin/rentals/qr");
        let body: serde_json::Value = serde_json::from_str(&read(req_ref.body)).unwrap();
        assert_eq!(body["qrToken"], "tok");
        assert_eq!(body["itemCategoryId"], 3);

        hby_free_request(req);
        hby_client_free(client);
    }

    #[test]
    fn build_return_by_blank_scan_returns_null() {
        let client = new_client();
        let raw = CString::new("   ").unwrap();
        assert!(hby_build_return_item_by_qr(client, raw.as_ptr()).is_null());
        hby_client_free(client);
    }

    #[test]
    fn parse_rental_qr_token_success() {
        let client = new_client();
        let body = CString::new(r#"{"isSuccess":true,"result":{"qrToken":"tok123","feePaid":true}}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = hby_parse_generate_rental_qr_token(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::QrToken);

        let token = unsafe { &*(r.data as *const FfiQrToken) };
        assert_eq!(read(token.qr_token), "tok123");
        assert!(token.fee_paid);

        hby_free_result(result);
        hby_client_free(client);
    }

    #[test]
    fn parse_rent_refusal_carries_code() {
        let client = new_client();
        let body = CString::new(r#"{"isSuccess":false,"code":"MEMBER_NOT_PAID","message":"미납"}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 400,
            body: body.as_ptr(),
        };
        let result = hby_parse_rent_item_by_qr(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Rental);
        assert_eq!(r.http_status, 400);
        assert_eq!(read(r.rental_code), "MEMBER_NOT_PAID");
        assert_eq!(read(r.error_message), "학생회비 미납자는 대여할 수 없어요.");

        hby_free_result(result);
        hby_client_free(client);
    }

    #[test]
    fn parse_return_unknown_failure_has_no_code() {
        let client = new_client();
        let resp = FfiHttpResponse {
            status: 502,
            body: std::ptr::null(),
        };
        let result = hby_parse_return_item_by_qr(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Rental);
        assert!(r.rental_code.is_null());
        assert_eq!(r.http_status, 502);

        hby_free_result(result);
        hby_client_free(client);
    }

    #[test]
    fn parse_blacklist_null_result_is_default() {
        let client = new_client();
        let body = CString::new(r#"{"isSuccess":true,"result":null}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = hby_parse_member_blacklist(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        let info = unsafe { &*(r.data as *const FfiBlacklist) };
        assert!(!info.blacklisted);
        assert!(info.blacklist_until.is_null());

        hby_free_result(result);
        hby_client_free(client);
    }

    #[test]
    fn parse_verify_fee_envelope_failure() {
        let client = new_client();
        let body = CString::new(r#"{"isSuccess":false,"result":null,"message":"만료된 QR"}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = hby_parse_verify_student_fee(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Envelope);
        assert_eq!(read(r.error_message), "만료된 QR");

        hby_free_result(result);
        hby_client_free(client);
    }

    #[test]
    fn parse_login_not_found() {
        let client = new_client();
        let resp = FfiHttpResponse {
            status: 404,
            body: std::ptr::null(),
        };
        let result = hby_parse_login(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NotFound);
        assert_eq!(r.http_status, 404);

        hby_free_result(result);
        hby_client_free(client);
    }

    #[test]
    fn normalize_payload_reads_category() {
        let raw = CString::new(r#"{"qrToken":"t","itemCategoryId":"8"}"#).unwrap();
        let result = hby_normalize_rental_qr_payload(raw.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.data_tag, FfiDataTag::QrPayload);
        let payload = unsafe { &*(r.data as *const FfiQrPayload) };
        assert_eq!(read(payload.qr_token), "t");
        assert!(payload.has_item_category_id);
        assert_eq!(payload.item_category_id, 8);
        hby_free_result(result);
    }

    #[test]
    fn invalid_utf8_input_reads_as_empty() {
        let raw = CString::new(vec![0xff, 0xfe]).unwrap();
        let result = hby_normalize_rental_qr_payload(raw.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        let payload = unsafe { &*(r.data as *const FfiQrPayload) };
        assert_eq!(read(payload.qr_token), "");
        assert!(!payload.has_item_category_id);
        hby_free_result(result);
    }

    #[test]
    fn parse_null_client_returns_null_arg() {
        let body = CString::new("{}").unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = hby_parse_member_blacklist(std::ptr::null(), &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);

        hby_free_result(result);
    }

    #[test]
    fn parse_null_response_returns_null_arg() {
        let client = new_client();
        let result = hby_parse_rent_item_by_qr(client, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);

        hby_free_result(result);
        hby_client_free(client);
    }

    #[test]
    fn free_request_null_is_safe() {
        hby_free_request(std::ptr::null_mut());
    }

    #[test]
    fn free_result_null_is_safe() {
        hby_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        hby_free_string(std::ptr::null_mut());
    }
}
