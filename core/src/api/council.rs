//! Council roster administration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::CouncilClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::value::{array_field, as_record, to_identifier, to_nullable_number, to_nullable_string};

pub const INVALID_COUNCIL_RESPONSE_MESSAGE: &str = "학생회 목록을 불러오지 못했습니다.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilMember {
    pub council_member_id: Option<i64>,
    pub student_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilStudentProfile {
    pub member_id: Option<i64>,
    pub student_id: String,
    pub name: String,
}

/// Stable list key: the numeric id when known, else the student id.
pub fn council_member_key(member: &CouncilMember) -> String {
    member
        .council_member_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| member.student_id.clone())
}

fn normalize_council_member(raw: &Value) -> CouncilMember {
    let empty = serde_json::Map::new();
    let record = as_record(raw).unwrap_or(&empty);
    CouncilMember {
        council_member_id: to_nullable_number(record.get("memberId")),
        student_id: to_identifier(record.get("studentId")).unwrap_or_else(|| "-".to_string()),
        name: to_nullable_string(record.get("studentName")).unwrap_or_default(),
    }
}

impl CouncilClient {
    pub fn build_council_members(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/admin/council/members", &[])
    }

    pub fn parse_council_members(&self, response: HttpResponse) -> Result<Vec<CouncilMember>, ApiError> {
        let result = self.envelope(&response)?.optional_result();
        let members = result
            .as_ref()
            .and_then(as_record)
            .filter(|r| r.get("studentCouncilMembers").is_some_and(Value::is_array))
            .ok_or_else(|| ApiError::envelope(INVALID_COUNCIL_RESPONSE_MESSAGE))?;
        Ok(array_field(members, "studentCouncilMembers")
            .iter()
            .map(normalize_council_member)
            .collect())
    }

    pub fn build_lookup_student(&self, student_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/admin/students/{}", student_id.trim()), &[])
    }

    /// `None` when the student does not exist (400, 404 or an empty result).
    pub fn parse_lookup_student(
        &self,
        response: HttpResponse,
        student_id: &str,
    ) -> Result<Option<CouncilStudentProfile>, ApiError> {
        if matches!(response.status, 400 | 404) {
            tracing::debug!(status = response.status, student_id, "student lookup miss");
            return Ok(None);
        }
        let result = self.envelope(&response)?.optional_result();
        let Some(record) = result.as_ref().and_then(as_record) else {
            return Ok(None);
        };
        Ok(Some(CouncilStudentProfile {
            member_id: to_nullable_number(record.get("memberId")),
            student_id: to_identifier(record.get("studentId")).unwrap_or_else(|| student_id.trim().to_string()),
            name: to_nullable_string(record.get("studentName")).unwrap_or_default(),
        }))
    }

    pub fn build_add_council_member(&self, member_id: i64) -> Result<HttpRequest, ApiError> {
        check_member_id(member_id)?;
        Ok(self.request(HttpMethod::Post, &format!("/admin/council/members/{member_id}"), &[]))
    }

    /// The add endpoint returns no detail, so only the id is filled in.
    pub fn parse_add_council_member(&self, response: HttpResponse, member_id: i64) -> Result<CouncilMember, ApiError> {
        self.envelope(&response)?.require_success("학생회 추가에 실패했습니다.")?;
        Ok(CouncilMember {
            council_member_id: Some(member_id),
            student_id: String::new(),
            name: String::new(),
        })
    }

    pub fn build_remove_council_member(&self, member_id: i64) -> Result<HttpRequest, ApiError> {
        check_member_id(member_id)?;
        Ok(self.request(HttpMethod::Delete, &format!("/admin/council/members/{member_id}"), &[]))
    }

    pub fn parse_remove_council_member(&self, response: HttpResponse) -> Result<(), ApiError> {
        self.envelope(&response)?.require_success("학생회 삭제에 실패했습니다.")
    }
}

fn check_member_id(member_id: i64) -> Result<(), ApiError> {
    if member_id <= 0 {
        return Err(ApiError::InvalidInput("유효하지 않은 사용자 ID입니다.".to_string()));
    }
    Ok(())
}
