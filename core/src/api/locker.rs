//! Lockers: the nine-section grid, the caller's own locker, and the admin
//! application / assignment workflow.
//!
//! # Design
//! The locker list arrives under several generations of field names. Every
//! entry is normalized into `LockerInfo` by `normalize_lockers`, which never
//! drops an entry and always resolves a number and a section.
//!
//! Loading the whole board issues one request per section. The host runs them
//! concurrently and hands all outcomes back to `collect_locker_sections`,
//! which joins them either fail-fast or settle-all.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::INVALID_RESPONSE_MESSAGE;
use crate::client::CouncilClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, TransportError};
use crate::value::{
    as_record, coalesce, decode_lenient, decode_rows, lenient, to_identifier, to_nullable_number, to_nullable_string,
};

/// One of the lettered locker zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LockerSection {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
}

impl LockerSection {
    pub const ALL: [LockerSection; 9] = [
        LockerSection::A,
        LockerSection::B,
        LockerSection::C,
        LockerSection::D,
        LockerSection::E,
        LockerSection::F,
        LockerSection::G,
        LockerSection::H,
        LockerSection::I,
    ];

    pub fn as_char(self) -> char {
        match self {
            LockerSection::A => 'A',
            LockerSection::B => 'B',
            LockerSection::C => 'C',
            LockerSection::D => 'D',
            LockerSection::E => 'E',
            LockerSection::F => 'F',
            LockerSection::G => 'G',
            LockerSection::H => 'H',
            LockerSection::I => 'I',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        let upper = c.to_ascii_uppercase();
        Self::ALL.into_iter().find(|s| s.as_char() == upper)
    }

    /// Accepts `"B"` exactly, or anything starting with a section letter
    /// (`"b-zone"`, `"C12"`).
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().chars().next().and_then(Self::from_char)
    }
}

impl fmt::Display for LockerSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockerStatus {
    Available,
    InUse,
    Broken,
    My,
}

impl LockerStatus {
    /// Absent status reads as in use; unknown strings as available.
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return LockerStatus::InUse;
        };
        match raw.trim().to_ascii_uppercase().as_str() {
            "IN_USE" => LockerStatus::InUse,
            "MY" => LockerStatus::My,
            "BROKEN" | "CANT_USE" | "UNAVAILABLE" => LockerStatus::Broken,
            _ => LockerStatus::Available,
        }
    }
}

/// A locker as shown on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockerInfo {
    pub id: String,
    pub locker_id: Option<i64>,
    pub label: String,
    pub section: LockerSection,
    pub number: i64,
    pub status: LockerStatus,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
}

/// Normalize a raw `/lockers` result.
///
/// The number is the first present of `lockerNumber`, `lockerNum`,
/// `lockerNo`, `lockerId`; then the digits of `lockerName`; then the entry's
/// one-based position.
pub fn normalize_lockers(raw: &[Value], fallback_section: LockerSection) -> Vec<LockerInfo> {
    raw.iter()
        .enumerate()
        .map(|(index, item)| normalize_locker(item, index, fallback_section))
        .collect()
}

fn normalize_locker(item: &Value, index: usize, fallback_section: LockerSection) -> LockerInfo {
    let empty = serde_json::Map::new();
    let record = as_record(item).unwrap_or(&empty);

    let from_name = to_nullable_string(record.get("lockerName"))
        .map(|name| name.chars().filter(char::is_ascii_digit).collect::<String>())
        .and_then(|digits| digits.parse::<i64>().ok())
        .filter(|n| *n > 0);
    let number = coalesce(record, &["lockerNumber", "lockerNum", "lockerNo", "lockerId"])
        .and_then(|v| to_nullable_number(Some(v)))
        .or(from_name)
        .unwrap_or(index as i64 + 1);

    let section = coalesce(record, &["lockerSection", "section", "sectionName"])
        .and_then(|v| to_identifier(Some(v)))
        .and_then(|raw| LockerSection::parse(&raw))
        .unwrap_or(fallback_section);

    let status = LockerStatus::normalize(record.get("lockerStatus").and_then(Value::as_str));
    let student_id = coalesce(record, &["studentId", "studentNumber", "memberNumber", "memberId"])
        .and_then(|v| to_identifier(Some(v)));
    let student_name = coalesce(record, &["studentName", "memberName", "name"])
        .and_then(|v| to_nullable_string(Some(v)));

    LockerInfo {
        id: format!("{section}-{number}"),
        locker_id: to_nullable_number(record.get("lockerId")),
        label: format!("{section}{number}"),
        section,
        number,
        status,
        student_id,
        student_name,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LockerSummary {
    pub available: usize,
    pub in_use: usize,
    pub broken: usize,
    pub my: usize,
}

pub fn summarize_lockers<'a>(lockers: impl IntoIterator<Item = &'a LockerInfo>) -> LockerSummary {
    lockers.into_iter().fold(LockerSummary::default(), |mut acc, locker| {
        match locker.status {
            LockerStatus::Available => acc.available += 1,
            LockerStatus::InUse => acc.in_use += 1,
            LockerStatus::Broken => acc.broken += 1,
            LockerStatus::My => acc.my += 1,
        }
        acc
    })
}

/// How `collect_locker_sections` treats a failed section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// The first failure fails the whole board.
    FailFast,
    /// Failed sections are reported; the rest are kept.
    SettleAll,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockerBoard {
    pub sections: Vec<(LockerSection, Vec<LockerInfo>)>,
    pub failed: Vec<(LockerSection, ApiError)>,
}

impl LockerBoard {
    pub fn lockers(&self) -> impl Iterator<Item = &LockerInfo> {
        self.sections.iter().flat_map(|(_, lockers)| lockers.iter())
    }

    pub fn section(&self, section: LockerSection) -> Option<&[LockerInfo]> {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, lockers)| lockers.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MyLockerStatus {
    Renting,
    RentalRequested,
    NoRental,
    Other(String),
}

impl MyLockerStatus {
    fn normalize(raw: Option<String>) -> Self {
        let Some(raw) = raw else {
            return MyLockerStatus::NoRental;
        };
        match raw.to_ascii_uppercase().as_str() {
            "RENTING" => MyLockerStatus::Renting,
            "RENTAL_REQUESTED" => MyLockerStatus::RentalRequested,
            "NO_RENTAL" => MyLockerStatus::NoRental,
            _ => MyLockerStatus::Other(raw),
        }
    }
}

/// The caller's own locker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MyLocker {
    pub locker_id: Option<i64>,
    pub locker_number: Option<String>,
    pub section: Option<LockerSection>,
    pub status: MyLockerStatus,
    pub assigned_at: Option<String>,
}

fn normalize_my_locker(result: &Value) -> MyLocker {
    let empty = serde_json::Map::new();
    let record = as_record(result).unwrap_or(&empty);
    let locker_number = coalesce(record, &["lockerNumber", "lockerName"]).and_then(|v| to_identifier(Some(v)));
    let section = to_nullable_string(record.get("lockerSection"))
        .or_else(|| locker_number.clone())
        .and_then(|s| LockerSection::parse(&s));
    MyLocker {
        locker_id: to_nullable_number(record.get("lockerId")),
        locker_number,
        section,
        status: MyLockerStatus::normalize(
            coalesce(record, &["lockerRentalStatus", "status"]).and_then(|v| to_nullable_string(Some(v))),
        ),
        assigned_at: to_nullable_string(record.get("assignedAt")),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LockerApplication {
    #[serde(deserialize_with = "lenient::number")]
    pub application_id: i64,
    #[serde(deserialize_with = "lenient::text")]
    pub application_start_at: String,
    #[serde(deserialize_with = "lenient::text")]
    pub application_end_at: String,
    #[serde(deserialize_with = "lenient::text")]
    pub semester: String,
    #[serde(deserialize_with = "lenient::text")]
    pub application_type: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub can_apply: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub can_assign: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLockerApplication {
    pub application_start_at: String,
    pub application_end_at: String,
    pub semester: String,
    /// `LOCKER_MAIN` or `LOCKER_ADDITIONAL`.
    pub application_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LockerApplicant {
    #[serde(deserialize_with = "lenient::text")]
    pub student_id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub student_name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub applied_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LockerApplicationDetail {
    #[serde(deserialize_with = "lenient::text")]
    pub application_start_at: String,
    #[serde(deserialize_with = "lenient::text")]
    pub application_end_at: String,
    #[serde(deserialize_with = "lenient::text")]
    pub semester: String,
    #[serde(deserialize_with = "lenient::text")]
    pub application_type: String,
    #[serde(deserialize_with = "lenient::number")]
    pub applicant_total_count: i64,
    #[serde(deserialize_with = "lenient::flag")]
    pub can_assign: bool,
    #[serde(deserialize_with = "lenient::rows")]
    pub applicants: Vec<LockerApplicant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LockerAssignment {
    #[serde(deserialize_with = "lenient::number")]
    pub locker_id: i64,
    #[serde(deserialize_with = "lenient::text")]
    pub locker_number: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub student_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub student_name: Option<String>,
}

/// Admin override of a single locker's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockerOverride {
    Unavailable,
    Available,
    Using { student_id: Option<String> },
}

impl CouncilClient {
    pub fn build_list_lockers(&self, section: LockerSection, semester: Option<&str>) -> HttpRequest {
        let section = section.to_string();
        let mut query = vec![("lockerSection", section.as_str())];
        if let Some(semester) = semester.filter(|s| !s.is_empty()) {
            query.push(("semester", semester));
        }
        self.request(HttpMethod::Get, "/lockers", &query)
    }

    pub fn parse_list_lockers(&self, response: HttpResponse, section: LockerSection) -> Result<Vec<LockerInfo>, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        let raw = result.as_array().map(Vec::as_slice).unwrap_or(&[]);
        Ok(normalize_lockers(raw, section))
    }

    /// One request per section, in section order.
    pub fn build_all_locker_sections(&self, semester: Option<&str>) -> Vec<(LockerSection, HttpRequest)> {
        LockerSection::ALL
            .into_iter()
            .map(|section| (section, self.build_list_lockers(section, semester)))
            .collect()
    }

    /// Join the per-section outcomes produced by the host.
    pub fn collect_locker_sections(
        &self,
        outcomes: Vec<(LockerSection, Result<HttpResponse, TransportError>)>,
        mode: JoinMode,
    ) -> Result<LockerBoard, ApiError> {
        let mut board = LockerBoard::default();
        for (section, outcome) in outcomes {
            let parsed = outcome
                .map_err(ApiError::from)
                .and_then(|response| self.parse_list_lockers(response, section));
            match (parsed, mode) {
                (Ok(lockers), _) => board.sections.push((section, lockers)),
                (Err(err), JoinMode::FailFast) => return Err(err),
                (Err(err), JoinMode::SettleAll) => {
                    tracing::warn!(%section, error = %err, "locker section failed to load");
                    board.failed.push((section, err));
                }
            }
        }
        board.sections.sort_by_key(|(section, _)| *section);
        Ok(board)
    }

    pub fn build_locker_semesters(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/lockers/semesters", &[])
    }

    pub fn parse_locker_semesters(&self, response: HttpResponse) -> Result<Vec<String>, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        Ok(string_list(&result))
    }

    pub fn build_my_locker(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/lockers/me", &[])
    }

    pub fn parse_my_locker(&self, response: HttpResponse) -> Result<MyLocker, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        Ok(normalize_my_locker(&result))
    }

    pub fn build_apply_locker(&self) -> HttpRequest {
        self.request(HttpMethod::Post, "/lockers/apply", &[])
    }

    pub fn parse_apply_locker(&self, response: HttpResponse) -> Result<(), ApiError> {
        self.envelope_or_empty(&response)?
            .reject_explicit_failure("사물함 신청에 실패했습니다.")
    }

    pub fn build_locker_applications(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/admin/lockers/applications", &[])
    }

    pub fn parse_locker_applications(&self, response: HttpResponse) -> Result<Vec<LockerApplication>, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        Ok(decode_rows(result))
    }

    pub fn build_create_locker_application(&self, payload: &NewLockerApplication) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/admin/lockers/applications", &[], payload)
    }

    pub fn parse_create_locker_application(&self, response: HttpResponse) -> Result<(), ApiError> {
        self.envelope_or_empty(&response)?
            .reject_explicit_failure("사물함 신청 기간을 생성하지 못했습니다.")
    }

    pub fn build_locker_application_detail(&self, application_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/admin/lockers/applications/{application_id}"), &[])
    }

    pub fn parse_locker_application_detail(&self, response: HttpResponse) -> Result<LockerApplicationDetail, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        decode_lenient(result)
    }

    pub fn build_finish_locker_application(&self, application_id: i64) -> HttpRequest {
        self.request(HttpMethod::Patch, &format!("/admin/lockers/applications/{application_id}"), &[])
    }

    pub fn build_assign_lockers(&self, application_id: i64) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            &format!("/admin/lockers/applications/assign/{application_id}"),
            &[],
        )
    }

    pub fn build_locker_assignments(&self, semester: Option<&str>) -> HttpRequest {
        let query: Vec<(&str, &str)> = semester
            .filter(|s| !s.is_empty())
            .map(|s| vec![("semester", s)])
            .unwrap_or_default();
        self.request(HttpMethod::Get, "/admin/lockers/applications/assign", &query)
    }

    pub fn parse_locker_assignments(&self, response: HttpResponse) -> Result<Vec<LockerAssignment>, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        Ok(decode_rows(result))
    }

    pub fn build_locker_assignment_semesters(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/admin/lockers/applications/assign/semester", &[])
    }

    pub fn parse_locker_assignment_semesters(&self, response: HttpResponse) -> Result<Vec<String>, ApiError> {
        self.parse_locker_semesters(response)
    }

    pub fn build_return_semester_lockers(&self) -> HttpRequest {
        self.request(HttpMethod::Patch, "/admin/lockers/return", &[])
    }

    pub fn build_override_locker(&self, locker_id: i64, action: &LockerOverride) -> HttpRequest {
        match action {
            LockerOverride::Unavailable => {
                self.request(HttpMethod::Patch, &format!("/admin/lockers/{locker_id}/unavailable"), &[])
            }
            LockerOverride::Available => {
                self.request(HttpMethod::Patch, &format!("/admin/lockers/{locker_id}/available"), &[])
            }
            LockerOverride::Using { student_id } => {
                let query: Vec<(&str, &str)> = student_id
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .map(|s| vec![("studentId", s)])
                    .unwrap_or_default();
                self.request(HttpMethod::Patch, &format!("/admin/lockers/{locker_id}/using"), &query)
            }
        }
    }

    /// Shared parser for the admin commands whose result is null: finish,
    /// assign, semester return and overrides.
    pub fn parse_locker_command(&self, response: HttpResponse) -> Result<(), ApiError> {
        self.envelope_or_empty(&response)?
            .reject_explicit_failure("사물함 요청을 처리하지 못했습니다.")
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(|v| to_nullable_string(Some(v))).collect())
        .unwrap_or_default()
}
