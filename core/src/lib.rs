//! Client core for the 회비영 student-council service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The mobile host executes the
//! actual HTTP round-trip, keeping the core deterministic and testable.
//!
//! # Design
//! - `CouncilClient` holds configuration and the bearer-token interceptor.
//!   Per-resource `build_*` / `parse_*` pairs live under `api`.
//! - Server payloads are normalized into closed types on the way in; raw
//!   JSON never leaves the `api` modules.
//! - `session::SessionStore` owns persisted credentials and is the only
//!   writer of the client's bearer token.
//! - `scanner::QrScanner` is the council-side scan state machine; its
//!   processors are the only place the core drives a `Transport` itself.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod jwt;
pub mod scanner;
pub mod session;

mod value;

pub use api::rental_admin::{normalize_rental_qr_payload, RentalQrPayload};
pub use client::{BearerAuth, CouncilClient, RequestInterceptor};
pub use config::ClientConfig;
pub use envelope::Envelope;
pub use error::{ApiError, RentalErrorCode, RentalScanError};
pub use http::{FormPart, HttpMethod, HttpRequest, HttpResponse, RequestBody, Transport, TransportError};
pub use scanner::{QrScanner, ScanDecision, ScanEffect, ScanOutcome, ScanResult, ScanState, ScannerConfig};
pub use session::{MemoryStorage, Role, RoleAccess, SecureStorage, Session, SessionPhase, SessionStore};
