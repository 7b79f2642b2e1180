//! Error types for the council API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." All other non-2xx responses land in `HttpError` with the raw
//! status code and body. A 2xx response whose envelope reports failure (or
//! carries no result) becomes `Envelope` with the message to show the user.
//!
//! Rent and return operations use `RentalScanError` instead, which keeps the
//! server's rejection code so scan processors can branch on it.

use crate::http::TransportError;

/// Errors returned by `CouncilClient` parse methods.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// `isSuccess` was false or `result` was missing.
    #[error("{message}")]
    Envelope { message: String },

    /// The response body could not be read as the expected shape.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// Rejected before any request was built.
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    pub(crate) fn envelope(message: impl Into<String>) -> Self {
        ApiError::Envelope {
            message: message.into(),
        }
    }

    /// Text suitable for showing on a screen.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Envelope { message } | ApiError::InvalidInput(message) => message.clone(),
            ApiError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

pub const GENERIC_ERROR_MESSAGE: &str = "요청을 처리하지 못했습니다. 잠시 후 다시 시도해주세요.";
pub const NETWORK_ERROR_MESSAGE: &str = "네트워크 연결을 확인한 뒤 다시 시도해주세요.";

/// Server rejection codes the rental flows recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RentalErrorCode {
    MemberIsBlacklist,
    MemberNotPaid,
    MemberHasOverdueItem,
    MemberAlreadyRentedSameCategory,
    ItemQuantityNonPositive,
    ItemCategoryNotFound,
    MemberNotFound,
    AlreadyReturn,
}

impl RentalErrorCode {
    pub const ALL: [RentalErrorCode; 8] = [
        RentalErrorCode::MemberIsBlacklist,
        RentalErrorCode::MemberNotPaid,
        RentalErrorCode::MemberHasOverdueItem,
        RentalErrorCode::MemberAlreadyRentedSameCategory,
        RentalErrorCode::ItemQuantityNonPositive,
        RentalErrorCode::ItemCategoryNotFound,
        RentalErrorCode::MemberNotFound,
        RentalErrorCode::AlreadyReturn,
    ];

    /// Trims and uppercases `raw`; anything outside the allow-list is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|code| code.as_str() == normalized)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RentalErrorCode::MemberIsBlacklist => "MEMBER_IS_BLACKLIST",
            RentalErrorCode::MemberNotPaid => "MEMBER_NOT_PAID",
            RentalErrorCode::MemberHasOverdueItem => "MEMBER_HAS_OVERDUE_ITEM",
            RentalErrorCode::MemberAlreadyRentedSameCategory => "MEMBER_ALREADY_RENTED_SAME_CATEGORY",
            RentalErrorCode::ItemQuantityNonPositive => "ITEM_QUANTITY_NON_POSITIVE",
            RentalErrorCode::ItemCategoryNotFound => "ITEM_CATEGORY_NOT_FOUND",
            RentalErrorCode::MemberNotFound => "MEMBER_NOT_FOUND",
            RentalErrorCode::AlreadyReturn => "ALREADY_RETURN",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RentalErrorCode::MemberIsBlacklist => "블랙리스트 대상자는 대여할 수 없어요.",
            RentalErrorCode::MemberNotPaid => "학생회비 미납자는 대여할 수 없어요.",
            RentalErrorCode::MemberHasOverdueItem => "연체 중인 물품이 있어 대여할 수 없어요.",
            RentalErrorCode::MemberAlreadyRentedSameCategory => "같은 종류의 물품을 이미 대여 중이에요.",
            RentalErrorCode::ItemQuantityNonPositive => "대여 가능한 재고가 없습니다.",
            RentalErrorCode::ItemCategoryNotFound => "물품 정보를 찾을 수 없어요.",
            RentalErrorCode::MemberNotFound => "학생 정보를 찾을 수 없어요.",
            RentalErrorCode::AlreadyReturn => "이미 반납이 완료된 물품이에요.",
        }
    }
}

impl std::fmt::Display for RentalErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a rent, return or manual-return request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RentalScanError {
    pub message: String,
    pub code: Option<RentalErrorCode>,
    pub status: Option<u16>,
}

impl RentalScanError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            status: None,
        }
    }

    pub fn with_code(mut self, code: Option<RentalErrorCode>) -> Self {
        self.code = code;
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Curated text for a recognized code, else the server's message.
    pub fn friendly_message(&self) -> Option<String> {
        if let Some(code) = self.code {
            return Some(code.message().to_string());
        }
        (!self.message.trim().is_empty()).then(|| self.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_parse_trims_and_uppercases() {
        assert_eq!(RentalErrorCode::parse(" already_return "), Some(RentalErrorCode::AlreadyReturn));
        assert_eq!(RentalErrorCode::parse("MEMBER_NOT_PAID"), Some(RentalErrorCode::MemberNotPaid));
    }

    #[test]
    fn code_parse_rejects_unknown() {
        assert_eq!(RentalErrorCode::parse("INTERNAL_SERVER_ERROR"), None);
        assert_eq!(RentalErrorCode::parse(""), None);
    }

    #[test]
    fn every_code_round_trips_through_its_name() {
        for code in RentalErrorCode::ALL {
            assert_eq!(RentalErrorCode::parse(code.as_str()), Some(code));
        }
    }

    #[test]
    fn friendly_message_prefers_curated_text() {
        let err = RentalScanError::new("server said no").with_code(Some(RentalErrorCode::MemberIsBlacklist));
        assert_eq!(err.friendly_message().as_deref(), Some("블랙리스트 대상자는 대여할 수 없어요."));

        let err = RentalScanError::new("  ");
        assert_eq!(err.friendly_message(), None);
    }

    #[test]
    fn friendly_message_keeps_server_text_verbatim() {
        let err = RentalScanError::new(" 반납 기한이 지났습니다.\n");
        assert_eq!(err.friendly_message().as_deref(), Some(" 반납 기한이 지났습니다.\n"));
    }

    #[test]
    fn transport_errors_show_network_message() {
        let err = ApiError::from(TransportError::Timeout);
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
        assert_eq!(ApiError::envelope("로그인에 실패했습니다.").user_message(), "로그인에 실패했습니다.");
    }
}
