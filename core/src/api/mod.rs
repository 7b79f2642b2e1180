//! Per-resource `build_*` / `parse_*` methods on `CouncilClient`.
//!
//! Each module owns one backend resource: its DTOs, the normalizers that turn
//! loosely-shaped server JSON into closed client types, and the `impl
//! CouncilClient` block for its endpoints.

pub mod auth;
pub mod chat;
pub mod council;
pub mod events;
pub mod items;
pub mod locker;
pub mod member;
pub mod rental;
pub mod rental_admin;
pub mod student_fee;

/// Fallback when the server gives no usable message.
pub const INVALID_RESPONSE_MESSAGE: &str = "유효하지 않은 서버 응답입니다.";
