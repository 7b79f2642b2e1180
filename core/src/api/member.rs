//! The signed-in member's own record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::INVALID_RESPONSE_MESSAGE;
use crate::client::CouncilClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::value::{as_record, decode_lenient, lenient, to_nullable_string, truthy};

/// Rental ban state. The default (not blacklisted) is returned whenever the
/// server has nothing usable to say.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBlacklistInfo {
    pub blacklisted: bool,
    pub blacklist_until: Option<String>,
}

pub fn normalize_blacklist_info(input: Option<&Value>) -> MemberBlacklistInfo {
    let Some(record) = input.and_then(as_record) else {
        return MemberBlacklistInfo::default();
    };
    let blacklist_until = record
        .get("blacklistUntil")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);
    MemberBlacklistInfo {
        blacklisted: truthy(record.get("blacklisted")),
        blacklist_until,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemberProfile {
    #[serde(deserialize_with = "lenient::opt_number")]
    pub member_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub student_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub role: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub member_status: Option<String>,
}

impl CouncilClient {
    pub fn build_member_blacklist(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/members/blacklist/me", &[])
    }

    pub fn parse_member_blacklist(&self, response: HttpResponse) -> Result<MemberBlacklistInfo, ApiError> {
        let result = self.envelope(&response)?.optional_result();
        Ok(normalize_blacklist_info(result.as_ref()))
    }

    pub fn build_member_profile(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/members/me", &[])
    }

    pub fn parse_member_profile(&self, response: HttpResponse) -> Result<MemberProfile, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        let mut profile: MemberProfile = decode_lenient(result.clone())?;
        // Older servers send the name as `studentName`.
        if profile.name.is_none() {
            profile.name = result.get("studentName").and_then(|v| to_nullable_string(Some(v)));
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> CouncilClient {
        CouncilClient::new("http://localhost:8080")
    }

    #[test]
    fn null_result_is_default() {
        let response = HttpResponse::new(200, r#"{"isSuccess":true,"result":null}"#);
        let info = client().parse_member_blacklist(response).unwrap();
        assert_eq!(info, MemberBlacklistInfo { blacklisted: false, blacklist_until: None });
    }

    #[test]
    fn blacklist_reads_truthy_flag_and_date() {
        let info = normalize_blacklist_info(Some(&json!({"blacklisted": 1, "blacklistUntil": "2025-12-31"})));
        assert!(info.blacklisted);
        assert_eq!(info.blacklist_until.as_deref(), Some("2025-12-31"));

        let info = normalize_blacklist_info(Some(&json!({"blacklisted": "", "blacklistUntil": "  "})));
        assert_eq!(info, MemberBlacklistInfo::default());

        assert_eq!(normalize_blacklist_info(Some(&json!("yes"))), MemberBlacklistInfo::default());
    }

    #[test]
    fn blacklist_request() {
        let req = client().build_member_blacklist();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/members/blacklist/me");
    }

    #[test]
    fn profile_falls_back_to_student_name() {
        let response = HttpResponse::new(
            200,
            r#"{"isSuccess":true,"result":{"memberId":3,"email":"a@b.c","studentId":"20201234","studentName":"김학생","role":"STUDENT","memberStatus":null}}"#,
        );
        let profile = client().parse_member_profile(response).unwrap();
        assert_eq!(profile.member_id, Some(3));
        assert_eq!(profile.name.as_deref(), Some("김학생"));
        assert_eq!(profile.member_status, None);
    }

    #[test]
    fn profile_accepts_numeric_student_id() {
        let response = HttpResponse::new(
            200,
            r#"{"isSuccess":true,"result":{"memberId":"3","studentId":20201234,"name":"김학생"}}"#,
        );
        let profile = client().parse_member_profile(response).unwrap();
        assert_eq!(profile.member_id, Some(3));
        assert_eq!(profile.student_id.as_deref(), Some("20201234"));
    }

    #[test]
    fn profile_requires_result() {
        let response = HttpResponse::new(200, r#"{"isSuccess":false,"message":"권한 없음"}"#);
        assert_eq!(client().parse_member_profile(response).unwrap_err(), ApiError::envelope("권한 없음"));
    }
}
