//! Account endpoints under `/api/auth`.

use serde::{Deserialize, Serialize};

use crate::client::CouncilClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::value::{decode_lenient, lenient, to_nullable_number};

const SIGN_UP_FAILED: &str = "회원가입에 실패했습니다.";
const LOGIN_FAILED: &str = "로그인에 실패했습니다.";
const LOGOUT_FAILED: &str = "로그아웃에 실패했습니다.";
const SEND_CODE_FAILED: &str = "이메일 인증 번호 전송에 실패했습니다.";
const VERIFY_CODE_FAILED: &str = "이메일 인증에 실패했습니다.";
const TMP_PASSWORD_FAILED: &str = "임시 비밀번호 발급에 실패했습니다.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub student_id: String,
    pub student_name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Tokens and identity returned by a successful login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginResult {
    #[serde(deserialize_with = "lenient::opt_number")]
    pub member_id: Option<i64>,
    #[serde(deserialize_with = "lenient::text")]
    pub role: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub student_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub member_status: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub access_token: String,
    #[serde(deserialize_with = "lenient::text")]
    pub refresh_token: String,
    #[serde(deserialize_with = "lenient::number")]
    pub expires_in: i64,
    #[serde(deserialize_with = "lenient::number")]
    pub refresh_expires_in: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendCodeResult {
    #[serde(deserialize_with = "lenient::text")]
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailNotice {
    #[serde(deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(deserialize_with = "lenient::text")]
    pub message: String,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct VerifyCodeBody<'a> {
    email: &'a str,
    code: &'a str,
}

impl CouncilClient {
    /// Account creation; the server calls this `sign-in`.
    pub fn build_sign_up(&self, payload: &SignUpRequest) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/auth/sign-in", &[], payload)
    }

    /// The new member's id.
    pub fn parse_sign_up(&self, response: HttpResponse) -> Result<i64, ApiError> {
        let result = self.envelope(&response)?.require_result(SIGN_UP_FAILED)?;
        to_nullable_number(result.get("memberId"))
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::envelope("생성된 회원 정보를 확인할 수 없습니다."))
    }

    pub fn build_login(&self, payload: &LoginRequest) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/auth/login", &[], payload)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<LoginResult, ApiError> {
        let result = self.envelope(&response)?.require_result(LOGIN_FAILED)?;
        // Some deployments send `status` instead of `memberStatus`.
        let status = result.get("status").and_then(|v| v.as_str()).map(str::to_string);
        let mut login: LoginResult = decode_lenient(result)?;
        if login.access_token.trim().is_empty() {
            return Err(ApiError::envelope(LOGIN_FAILED));
        }
        if login.member_status.is_none() {
            login.member_status = status;
        }
        Ok(login)
    }

    pub fn build_logout(&self) -> HttpRequest {
        self.request(HttpMethod::Post, "/api/auth/logout", &[])
    }

    pub fn parse_logout(&self, response: HttpResponse) -> Result<(), ApiError> {
        self.envelope(&response)?.require_success(LOGOUT_FAILED)
    }

    pub fn build_send_email_code(&self, email: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/auth/send-code", &[], &EmailBody { email })
    }

    pub fn parse_send_email_code(&self, response: HttpResponse) -> Result<SendCodeResult, ApiError> {
        let result = self.envelope(&response)?.require_result(SEND_CODE_FAILED)?;
        decode_lenient(result)
    }

    pub fn build_verify_email_code(&self, email: &str, code: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/api/auth/verify-code", &[], &VerifyCodeBody { email, code })
    }

    pub fn parse_verify_email_code(&self, response: HttpResponse) -> Result<EmailNotice, ApiError> {
        let result = self.envelope(&response)?.require_result(VERIFY_CODE_FAILED)?;
        decode_lenient(result)
    }

    /// Temporary password mailed to `email`; no body, the address is a query
    /// parameter.
    pub fn build_issue_temp_password(&self, email: &str) -> HttpRequest {
        self.request(HttpMethod::Post, "/api/auth/tmp-password", &[("email", email)])
    }

    pub fn parse_issue_temp_password(&self, response: HttpResponse) -> Result<EmailNotice, ApiError> {
        let result = self.envelope(&response)?.require_result(TMP_PASSWORD_FAILED)?;
        decode_lenient(result)
    }
}
