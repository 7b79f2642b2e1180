//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use hoebiyoung_core::api::auth::LoginResult;
use hoebiyoung_core::api::member::MemberBlacklistInfo;
use hoebiyoung_core::{ApiError, HttpMethod, HttpRequest, RentalQrPayload, RentalScanError};

/// Opaque handle to a `CouncilClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiCouncilClient {
    pub(crate) inner: hoebiyoung_core::CouncilClient,
}

/// Copy `s` into a C string owned by the caller. Interior NULs are dropped.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s: String = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

pub(crate) fn c_string_opt(s: Option<impl Into<String>>) -> *mut c_char {
    s.map(c_string).unwrap_or(std::ptr::null_mut())
}

/// Release a string produced by `c_string`. Null is ignored.
pub(crate) fn drop_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
    Patch = 4,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
            HttpMethod::Patch => FfiHttpMethod::Patch,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `hby_build_*` functions. The C caller executes the request
/// (honoring `timeout_ms`) and passes the response back through `hby_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    /// JSON text, or null when the request has no body.
    pub body: *mut c_char,
    pub timeout_ms: u64,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    ///
    /// Only JSON bodies cross this boundary; none of the exported builders
    /// produce multipart forms.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let body = c_string_opt(req.json_body());
        let timeout_ms = u64::try_from(req.timeout.as_millis()).unwrap_or(u64::MAX);

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body,
            timeout_ms,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a `hby_parse_*` function. The FFI layer reads
/// but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Http = 2,
    Deserialization = 3,
    Serialization = 4,
    Panic = 5,
    NullArg = 6,
    /// `isSuccess` false or no result; `error_message` is user-facing.
    Envelope = 7,
    InvalidInput = 8,
    Transport = 9,
    /// A rent or return was refused; see `rental_code`.
    Rental = 10,
}

/// Tag that tells `hby_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    QrToken = 1,
    Blacklist = 2,
    Approval = 3,
    QrPayload = 4,
    Login = 5,
}

/// A generated QR token. `fee_paid` is the student-fee flag that came with it.
#[repr(C)]
pub struct FfiQrToken {
    pub qr_token: *mut c_char,
    pub fee_paid: bool,
}

#[repr(C)]
pub struct FfiBlacklist {
    pub blacklisted: bool,
    /// Null when no end date is known.
    pub blacklist_until: *mut c_char,
}

#[repr(C)]
pub struct FfiApproval {
    pub approved: bool,
}

/// A decoded scan. `item_category_id` is meaningful only when
/// `has_item_category_id` is set.
#[repr(C)]
pub struct FfiQrPayload {
    pub qr_token: *mut c_char,
    pub has_item_category_id: bool,
    pub item_category_id: i64,
}

/// Login outcome. `member_id` is 0 when the server did not send one.
#[repr(C)]
pub struct FfiLogin {
    pub member_id: i64,
    pub role: *mut c_char,
    pub access_token: *mut c_char,
    pub refresh_token: *mut c_char,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null. `rental_code` carries the
/// server's rejection code for refused rents and returns.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub rental_code: *mut c_char,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            rental_code: std::ptr::null_mut(),
            data_tag,
            data,
        }))
    }

    fn error(error_code: FfiErrorCode, message: impl Into<String>, http_status: u16) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: c_string(message),
            http_status,
            rental_code: std::ptr::null_mut(),
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn ok_qr_token(qr_token: String, fee_paid: bool) -> *mut Self {
        let data = Box::new(FfiQrToken {
            qr_token: c_string(qr_token),
            fee_paid,
        });
        Self::ok(FfiDataTag::QrToken, Box::into_raw(data) as *mut c_void)
    }

    pub(crate) fn ok_blacklist(info: MemberBlacklistInfo) -> *mut Self {
        let data = Box::new(FfiBlacklist {
            blacklisted: info.blacklisted,
            blacklist_until: c_string_opt(info.blacklist_until),
        });
        Self::ok(FfiDataTag::Blacklist, Box::into_raw(data) as *mut c_void)
    }

    pub(crate) fn ok_approval(approved: bool) -> *mut Self {
        Self::ok(FfiDataTag::Approval, Box::into_raw(Box::new(FfiApproval { approved })) as *mut c_void)
    }

    pub(crate) fn ok_qr_payload(payload: RentalQrPayload) -> *mut Self {
        let data = Box::new(FfiQrPayload {
            qr_token: c_string(payload.qr_token),
            has_item_category_id: payload.item_category_id.is_some(),
            item_category_id: payload.item_category_id.unwrap_or(0),
        });
        Self::ok(FfiDataTag::QrPayload, Box::into_raw(data) as *mut c_void)
    }

    pub(crate) fn ok_login(login: LoginResult) -> *mut Self {
        let data = Box::new(FfiLogin {
            member_id: login.member_id.unwrap_or(0),
            role: c_string(login.role),
            access_token: c_string(login.access_token),
            refresh_token: c_string(login.refresh_token),
        });
        Self::ok(FfiDataTag::Login, Box::into_raw(data) as *mut c_void)
    }

    /// Build a success result with no data payload.
    pub(crate) fn ok_empty() -> *mut Self {
        Self::ok(FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::NotFound => (FfiErrorCode::NotFound, 404u16),
            ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::Envelope { .. } => (FfiErrorCode::Envelope, 0),
            ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0),
            ApiError::InvalidInput(_) => (FfiErrorCode::InvalidInput, 0),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
        };
        Self::error(error_code, err.user_message(), http_status)
    }

    /// Build an error result from a refused rent or return. The message is
    /// the curated text for the code when one is known.
    pub(crate) fn from_rental_error(err: RentalScanError) -> *mut Self {
        let message = err.friendly_message().unwrap_or_else(|| err.message.clone());
        Box::into_raw(Box::new(FfiResult {
            error_code: FfiErrorCode::Rental,
            error_message: c_string(message),
            http_status: err.status.unwrap_or(0),
            rental_code: c_string_opt(err.code.map(|code| code.as_str())),
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, format!("null argument: {name}"), 0)
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg, 0)
    }
}
