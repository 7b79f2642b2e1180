//! Student-fee QR: students show a token, council staff verify it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::INVALID_RESPONSE_MESSAGE;
use crate::client::CouncilClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::value::{decode_lenient, lenient};

pub const INVALID_FEE_TOKEN_MESSAGE: &str = "QR 토큰이 올바르지 않습니다.";
pub const FEE_UNVERIFIABLE_MESSAGE: &str = "학생회비 정보를 확인할 수 없어요.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentFeeQrToken {
    #[serde(deserialize_with = "lenient::text")]
    pub qr_token: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub fee_paid: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyFeeBody<'a> {
    qr_token: &'a str,
}

impl CouncilClient {
    pub fn build_generate_student_fee_qr_token(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/members/fee/qr-tokens", &[])
    }

    pub fn parse_generate_student_fee_qr_token(&self, response: HttpResponse) -> Result<StudentFeeQrToken, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        decode_lenient(result)
    }

    /// Council side: check a scanned fee token.
    pub fn build_verify_student_fee(&self, qr_token: &str) -> Result<HttpRequest, ApiError> {
        if qr_token.is_empty() {
            return Err(ApiError::InvalidInput(INVALID_FEE_TOKEN_MESSAGE.to_string()));
        }
        self.json_request(HttpMethod::Post, "/admin/fee/qr-tokens", &[], &VerifyFeeBody { qr_token })
    }

    /// `true` when the member has paid.
    pub fn parse_verify_student_fee(&self, response: HttpResponse) -> Result<bool, ApiError> {
        let envelope = self.envelope(&response)?;
        let approved = envelope
            .result
            .as_ref()
            .and_then(|r| r.get("approved"))
            .and_then(Value::as_bool);
        approved.ok_or_else(|| ApiError::envelope(envelope.message.unwrap_or_else(|| FEE_UNVERIFIABLE_MESSAGE.to_string())))
    }
}
