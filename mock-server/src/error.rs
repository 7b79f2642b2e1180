use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Failures reported in the `{ isSuccess: false, code, message }` envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("로그인이 필요합니다.")]
    NotLoggedIn,
    #[error("권한이 없습니다.")]
    PermissionDenied,
    #[error("이메일 또는 비밀번호가 올바르지 않습니다.")]
    InvalidCredentials,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
    /// A rental rule rejected the request; the code is part of the body.
    #[error("{message}")]
    Rental { code: &'static str, message: &'static str },
}

impl Error {
    pub fn rental(code: &'static str) -> Self {
        let message = match code {
            "MEMBER_IS_BLACKLIST" => "블랙리스트 회원입니다.",
            "MEMBER_NOT_PAID" => "학생회비 미납 회원입니다.",
            "MEMBER_HAS_OVERDUE_ITEM" => "연체 중인 물품이 있습니다.",
            "MEMBER_ALREADY_RENTED_SAME_CATEGORY" => "이미 같은 물품을 대여 중입니다.",
            "ITEM_QUANTITY_NON_POSITIVE" => "재고가 없습니다.",
            "ITEM_CATEGORY_NOT_FOUND" => "물품 종류가 없습니다.",
            "MEMBER_NOT_FOUND" => "회원을 찾을 수 없습니다.",
            "ALREADY_RETURN" => "이미 반납된 물품입니다.",
            _ => "요청을 처리할 수 없습니다.",
        };
        Error::Rental { code, message }
    }

    pub fn to_status_code(&self) -> StatusCode {
        match self {
            Error::NotLoggedIn | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Rental { code: "ALREADY_RETURN", .. } => StatusCode::CONFLICT,
            Error::Rental { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            Error::Rental { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let body = json!({
            "isSuccess": false,
            "result": null,
            "code": self.code(),
            "message": self.to_string(),
        });
        (self.to_status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_return_is_a_conflict() {
        assert_eq!(Error::rental("ALREADY_RETURN").to_status_code(), StatusCode::CONFLICT);
        assert_eq!(Error::rental("MEMBER_NOT_PAID").to_status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn only_rental_errors_carry_a_code() {
        assert_eq!(Error::rental("MEMBER_NOT_FOUND").code(), Some("MEMBER_NOT_FOUND"));
        assert_eq!(Error::NotLoggedIn.code(), None);
    }
}
