//! Request builder and response parser for the council REST API.
//!
//! # Design
//! `CouncilClient` holds the configuration and the request interceptors and
//! carries no other state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`; the per-resource methods live in `crate::api`.
//! The caller executes the actual HTTP round-trip, keeping the core
//! deterministic and free of I/O dependencies.
//!
//! The bearer token is the only mutable piece. It sits in a `BearerAuth`
//! interceptor owned by the client and is changed only by the session store
//! on login, logout and restore.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::http::{FormPart, HttpMethod, HttpRequest, HttpResponse, RequestBody};

pub const AUTHORIZATION: &str = "authorization";
pub const CONTENT_TYPE: &str = "content-type";

/// Hook applied to every request after it is built.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: &mut HttpRequest);
}

/// Adds `authorization: Bearer <token>` unless the request already has an
/// authorization header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerAuth {
    token: Option<String>,
}

impl BearerAuth {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set(&mut self, token: Option<&str>) {
        self.token = token.map(str::to_string);
    }
}

impl RequestInterceptor for BearerAuth {
    fn intercept(&self, request: &mut HttpRequest) {
        let Some(token) = &self.token else {
            return;
        };
        if request.header(AUTHORIZATION).is_none() {
            request
                .headers
                .push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        }
    }
}

/// Synchronous client for the council API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Clone)]
pub struct CouncilClient {
    base_url: String,
    config: ClientConfig,
    auth: BearerAuth,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl fmt::Debug for CouncilClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CouncilClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.config.timeout)
            .field("authenticated", &self.auth.token.is_some())
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl CouncilClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_config(ClientConfig::new(base_url))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
            auth: BearerAuth::default(),
            interceptors: Vec::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Install (`Some`) or remove (`None`) the bearer token.
    pub fn set_auth_token(&mut self, token: Option<&str>) {
        self.auth.set(token);
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth.token()
    }

    pub fn add_interceptor(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.interceptors.push(interceptor);
    }

    // -----------------------------------------------------------------------
    // Request construction
    // -----------------------------------------------------------------------

    pub(crate) fn url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = format!("{}{path}", self.base_url);
        if !query.is_empty() {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish();
            url.push('?');
            url.push_str(&encoded);
        }
        url
    }

    fn finish(&self, mut request: HttpRequest) -> HttpRequest {
        self.auth.intercept(&mut request);
        for interceptor in &self.interceptors {
            interceptor.intercept(&mut request);
        }
        request
    }

    pub(crate) fn request(&self, method: HttpMethod, path: &str, query: &[(&str, &str)]) -> HttpRequest {
        self.finish(HttpRequest {
            method,
            url: self.url(path, query),
            headers: vec![(CONTENT_TYPE.to_string(), "application/json".to_string())],
            body: None,
            timeout: self.config.timeout,
        })
    }

    pub(crate) fn json_request<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, &str)],
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut request = self.request(method, path, query);
        request.body = Some(RequestBody::Json(body));
        Ok(request)
    }

    pub(crate) fn multipart_request(&self, method: HttpMethod, path: &str, parts: Vec<FormPart>) -> HttpRequest {
        self.finish(HttpRequest {
            method,
            url: self.url(path, &[]),
            headers: vec![(CONTENT_TYPE.to_string(), "multipart/form-data".to_string())],
            body: Some(RequestBody::Multipart(parts)),
            timeout: self.config.timeout,
        })
    }

    // -----------------------------------------------------------------------
    // Response handling
    // -----------------------------------------------------------------------

    /// Status check followed by a strict envelope parse.
    pub(crate) fn envelope(&self, response: &HttpResponse) -> Result<Envelope, ApiError> {
        check_status(response)?;
        Envelope::parse(&response.body)
    }

    /// Like `envelope`, but an empty 2xx body reads as an empty envelope.
    pub(crate) fn envelope_or_empty(&self, response: &HttpResponse) -> Result<Envelope, ApiError> {
        check_status(response)?;
        if response.body.trim().is_empty() {
            return Ok(Envelope::default());
        }
        Envelope::parse(&response.body)
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
///
/// Every failure is logged before it is returned.
pub(crate) fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    tracing::warn!(status = response.status, body = %response.body, "api error");
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
