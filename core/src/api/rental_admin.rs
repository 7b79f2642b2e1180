//! Council-side rentals: QR check-out / check-in, the rental ledger, and
//! manual returns.
//!
//! # Design
//! Scanned QR text is decoded by `normalize_rental_qr_payload`, which never
//! fails; an unusable scan only surfaces when the resulting token is empty.
//! Rent and return outcomes are reported as `RentalScanError`, keeping the
//! server's rejection code (when it is on the allow-list) and HTTP status so
//! scan processors can classify them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rental::{normalize_rental_status, RentalStatus, UNKNOWN_ITEM_NAME};
use crate::client::{check_status, CouncilClient};
use crate::envelope::Envelope;
use crate::error::{ApiError, RentalErrorCode, RentalScanError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, TransportError};
use crate::jwt::{decode_jwt_payload, numeric_claim};
use crate::value::{array_field, as_record, coalesce, to_nullable_number, to_nullable_string};

pub const DEFAULT_RENTAL_ERROR_MESSAGE: &str = "물품 대여를 진행하지 못했습니다.";
pub const DEFAULT_RETURN_ERROR_MESSAGE: &str = "반납 처리를 완료하지 못했습니다.";
pub const INVALID_QR_MESSAGE: &str = "올바른 QR 코드가 아닙니다.";
pub const INVALID_RENTAL_HISTORY_MESSAGE: &str = "유효하지 않은 대여 이력입니다.";

/// A decoded QR scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalQrPayload {
    pub qr_token: String,
    pub item_category_id: Option<i64>,
}

/// Decode scanned QR text.
///
/// Tried in order: a JSON object with a string `qrToken` (and optional
/// `itemCategoryId`); a JWT whose claims carry `itemCategoryId` or
/// `categoryId`; otherwise the trimmed text is an opaque token without a
/// category hint.
pub fn normalize_rental_qr_payload(raw: &str) -> RentalQrPayload {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return RentalQrPayload {
            qr_token: String::new(),
            item_category_id: None,
        };
    }

    if let Ok(Value::Object(parsed)) = serde_json::from_str::<Value>(trimmed) {
        if let Some(token) = parsed.get("qrToken").and_then(Value::as_str) {
            return RentalQrPayload {
                qr_token: token.to_string(),
                item_category_id: to_nullable_number(parsed.get("itemCategoryId")),
            };
        }
    }

    let item_category_id =
        decode_jwt_payload(trimmed).and_then(|claims| numeric_claim(&claims, &["itemCategoryId", "categoryId"]));

    RentalQrPayload {
        qr_token: trimmed.to_string(),
        item_category_id,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RentalQrBody<'a> {
    qr_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_category_id: Option<i64>,
}

/// One row of the council rental ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRentalHistory {
    pub rental_history_id: Option<i64>,
    pub item_name: String,
    pub item_category_id: Option<i64>,
    pub item_category_name: String,
    pub renter_name: String,
    pub renter_student_id: String,
    pub rental_started_at: Option<String>,
    pub expected_return_at: Option<String>,
    pub returned_at: Option<String>,
    pub rental_status: RentalStatus,
}

impl Default for AdminRentalHistory {
    fn default() -> Self {
        Self {
            rental_history_id: None,
            item_name: UNKNOWN_ITEM_NAME.to_string(),
            item_category_id: None,
            item_category_name: "기타".to_string(),
            renter_name: "알 수 없음".to_string(),
            renter_student_id: "-".to_string(),
            rental_started_at: None,
            expected_return_at: None,
            returned_at: None,
            rental_status: RentalStatus::InProgress,
        }
    }
}

pub fn normalize_admin_rental_history(input: &Value) -> AdminRentalHistory {
    let Some(record) = as_record(input) else {
        return AdminRentalHistory::default();
    };
    let defaults = AdminRentalHistory::default();
    let nested_category_id = record.get("itemCategory").and_then(|c| c.get("id"));

    AdminRentalHistory {
        rental_history_id: to_nullable_number(record.get("rentalHistoryId")),
        item_name: to_nullable_string(record.get("itemName")).unwrap_or(defaults.item_name),
        item_category_id: to_nullable_number(record.get("itemCategoryId").filter(|v| !v.is_null()).or(nested_category_id)),
        item_category_name: to_nullable_string(coalesce(record, &["itemCategoryName", "categoryName", "itemCategory"]))
            .unwrap_or(defaults.item_category_name),
        renter_name: to_nullable_string(coalesce(record, &["memberName", "renterName", "studentName"]))
            .unwrap_or(defaults.renter_name),
        renter_student_id: to_nullable_string(coalesce(
            record,
            &["memberStudentId", "studentId", "studentCode", "renterStudentId"],
        ))
        .unwrap_or(defaults.renter_student_id),
        rental_started_at: to_nullable_string(coalesce(record, &["rentalStartedAt", "rentalStartAt"])),
        expected_return_at: to_nullable_string(coalesce(
            record,
            &["expectedReturnAt", "rentalEndedAt", "rentalEndAt", "returnDueDate", "returnDueDateAt"],
        )),
        returned_at: to_nullable_string(record.get("returnedAt")),
        rental_status: normalize_rental_status(record.get("rentalStatus")),
    }
}

pub fn normalize_admin_rental_history_list(input: Option<&Value>) -> Vec<AdminRentalHistory> {
    input
        .and_then(as_record)
        .map(|record| array_field(record, "items").iter().map(normalize_admin_rental_history).collect())
        .unwrap_or_default()
}

/// Transport failure on a rent or return call.
pub fn rental_error_from_transport(err: &TransportError, default_message: &str) -> RentalScanError {
    tracing::warn!(error = %err, "rental request did not reach the server");
    RentalScanError::new(default_message)
}

/// Classify a rent / return / manual-return response.
fn parse_rental_action(response: &HttpResponse, default_message: &str) -> Result<(), RentalScanError> {
    if let Err(err) = check_status(response) {
        let payload = Envelope::lenient(&response.body);
        let raw_code = payload.code.or(payload.error_code).or(payload.status);
        let code = raw_code.as_deref().and_then(RentalErrorCode::parse);
        let message = payload.message.unwrap_or_else(|| default_message.to_string());
        tracing::debug!(error = %err, ?code, "rental request rejected");
        return Err(RentalScanError::new(message)
            .with_code(code)
            .with_status(response.status));
    }

    let envelope = if response.body.trim().is_empty() {
        Envelope::default()
    } else {
        Envelope::parse(&response.body).map_err(|_| RentalScanError::new(default_message))?
    };
    if envelope.succeeded() {
        return Ok(());
    }
    let code = envelope
        .code
        .or(envelope.error_code)
        .as_deref()
        .and_then(RentalErrorCode::parse);
    Err(RentalScanError::new(envelope.message.unwrap_or_else(|| default_message.to_string())).with_code(code))
}

/// Candidate endpoints for a manual return, tried in order.
pub fn manual_return_paths(rental_history_id: i64) -> [String; 2] {
    [
        format!("/admin/rentals/{rental_history_id}/return"),
        format!("/admin/lockers/{rental_history_id}/return"),
    ]
}

/// Drives a manual return across the candidate endpoints.
///
/// Call `next_request`, execute it, and feed the outcome to `record`. Stop
/// when `record` returns `ManualReturnStep::Done`.
#[derive(Debug, Clone)]
pub struct ManualReturn {
    requests: Vec<HttpRequest>,
    next: usize,
    last_error: Option<RentalScanError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualReturnStep {
    /// Try the next candidate.
    Continue,
    Done(Result<(), RentalScanError>),
}

impl ManualReturn {
    pub fn next_request(&self) -> Option<&HttpRequest> {
        self.requests.get(self.next)
    }

    pub fn record(&mut self, outcome: Result<HttpResponse, TransportError>) -> ManualReturnStep {
        self.next += 1;
        let (error, fatal) = match outcome {
            Ok(response) => match parse_rental_action(&response, DEFAULT_RETURN_ERROR_MESSAGE) {
                Ok(()) => return ManualReturnStep::Done(Ok(())),
                Err(err) => (err, response.status >= 500),
            },
            Err(err) => (rental_error_from_transport(&err, DEFAULT_RETURN_ERROR_MESSAGE), false),
        };
        self.last_error = Some(error);
        if fatal || self.next >= self.requests.len() {
            let error = self
                .last_error
                .take()
                .unwrap_or_else(|| RentalScanError::new(DEFAULT_RETURN_ERROR_MESSAGE));
            return ManualReturnStep::Done(Err(error));
        }
        ManualReturnStep::Continue
    }
}

impl CouncilClient {
    fn build_rental_qr_action(&self, path: &str, raw: &str) -> Result<HttpRequest, RentalScanError> {
        let payload = normalize_rental_qr_payload(raw);
        if payload.qr_token.is_empty() {
            return Err(RentalScanError::new(INVALID_QR_MESSAGE));
        }
        let body = RentalQrBody {
            qr_token: &payload.qr_token,
            item_category_id: payload.item_category_id,
        };
        self.json_request(HttpMethod::Post, path, &[], &body)
            .map_err(|e| RentalScanError::new(e.to_string()))
    }

    /// Check an item out to the student whose QR was scanned.
    pub fn build_rent_item_by_qr(&self, raw: &str) -> Result<HttpRequest, RentalScanError> {
        self.build_rental_qr_action("/admin/rentals/qr", raw)
    }

    pub fn parse_rent_item_by_qr(&self, response: HttpResponse) -> Result<(), RentalScanError> {
        parse_rental_action(&response, DEFAULT_RENTAL_ERROR_MESSAGE)
    }

    /// Check an item back in from a scanned return QR.
    pub fn build_return_item_by_qr(&self, raw: &str) -> Result<HttpRequest, RentalScanError> {
        self.build_rental_qr_action("/admin/rentals/return", raw)
    }

    pub fn parse_return_item_by_qr(&self, response: HttpResponse) -> Result<(), RentalScanError> {
        parse_rental_action(&response, DEFAULT_RENTAL_ERROR_MESSAGE)
    }

    pub fn build_admin_rental_histories(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/admin/rentals", &[])
    }

    pub fn parse_admin_rental_histories(&self, response: HttpResponse) -> Result<Vec<AdminRentalHistory>, ApiError> {
        let result = self.envelope(&response)?.optional_result();
        Ok(normalize_admin_rental_history_list(result.as_ref()))
    }

    pub fn manual_return(&self, rental_history_id: i64) -> Result<ManualReturn, RentalScanError> {
        if rental_history_id <= 0 {
            return Err(RentalScanError::new(INVALID_RENTAL_HISTORY_MESSAGE));
        }
        let requests = manual_return_paths(rental_history_id)
            .iter()
            .map(|path| self.request(HttpMethod::Post, path, &[]))
            .collect();
        Ok(ManualReturn {
            requests,
            next: 0,
            last_error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::tests::make_token;
    use serde_json::json;

    fn client() -> CouncilClient {
        CouncilClient::new("http://localhost:8080")
    }

    #[test]
    fn payload_empty_input() {
        assert_eq!(
            normalize_rental_qr_payload(""),
            RentalQrPayload { qr_token: String::new(), item_category_id: None }
        );
        assert_eq!(normalize_rental_qr_payload("   ").qr_token, "");
    }

    #[test]
    fn payload_json_envelope() {
        assert_eq!(
            normalize_rental_qr_payload(r#"{"qrToken":"abc","itemCategoryId":7}"#),
            RentalQrPayload { qr_token: "abc".to_string(), item_category_id: Some(7) }
        );
        assert_eq!(
            normalize_rental_qr_payload(r#" {"qrToken":"abc","itemCategoryId":"x"} "#).item_category_id,
            None
        );
    }

    #[test]
    fn payload_bare_token() {
        assert_eq!(
            normalize_rental_qr_payload("xyz"),
            RentalQrPayload { qr_token: "xyz".to_string(), item_category_id: None }
        );
    }

    #[test]
    fn payload_json_without_token_is_opaque() {
        let raw = r#"{"token":"abc"}"#;
        assert_eq!(normalize_rental_qr_payload(raw).qr_token, raw);
        assert_eq!(normalize_rental_qr_payload("42").qr_token, "42");
    }

    #[test]
    fn payload_jwt_category_hint() {
        let token = make_token(&json!({"sub": "1", "categoryId": "12"}));
        assert_eq!(
            normalize_rental_qr_payload(&format!("  {token}\n")),
            RentalQrPayload { qr_token: token.clone(), item_category_id: Some(12) }
        );
        let token = make_token(&json!({"itemCategoryId": 3, "categoryId": 12}));
        assert_eq!(normalize_rental_qr_payload(&token).item_category_id, Some(3));
    }

    #[test]
    fn rent_request_body() {
        let req = client()
            .build_rent_item_by_qr(r#"{"qrToken":"abc","itemCategoryId":7}"#)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/admin/rentals/qr");
        let body: Value = serde_json::from_str(req.json_body().unwrap()).unwrap();
        assert_eq!(body, json!({"qrToken": "abc", "itemCategoryId": 7}));

        let req = client().build_return_item_by_qr("opaque").unwrap();
        assert_eq!(req.url, "http://localhost:8080/admin/rentals/return");
        let body: Value = serde_json::from_str(req.json_body().unwrap()).unwrap();
        assert_eq!(body, json!({"qrToken": "opaque"}));
    }

    #[test]
    fn empty_scan_is_rejected_before_building() {
        let err = client().build_return_item_by_qr("  ").unwrap_err();
        assert_eq!(err, RentalScanError::new(INVALID_QR_MESSAGE));
    }

    #[test]
    fn rejection_in_success_status_keeps_code() {
        let response = HttpResponse::new(200, r#"{"isSuccess":false,"errorCode":"already_return","message":"이미 반납"}"#);
        let err = client().parse_return_item_by_qr(response).unwrap_err();
        assert_eq!(err.code, Some(RentalErrorCode::AlreadyReturn));
        assert_eq!(err.message, "이미 반납");
        assert_eq!(err.status, None);
    }

    #[test]
    fn rejection_in_error_status_reads_status_field() {
        let response = HttpResponse::new(400, r#"{"isSuccess":false,"status":"MEMBER_NOT_PAID"}"#);
        let err = client().parse_rent_item_by_qr(response).unwrap_err();
        assert_eq!(err.code, Some(RentalErrorCode::MemberNotPaid));
        assert_eq!(err.message, DEFAULT_RENTAL_ERROR_MESSAGE);
        assert_eq!(err.status, Some(400));
    }

    #[test]
    fn unknown_code_is_dropped() {
        let response = HttpResponse::new(409, r#"{"code":"SOMETHING_NEW","message":"?"}"#);
        let err = client().parse_rent_item_by_qr(response).unwrap_err();
        assert_eq!(err.code, None);
        assert_eq!(err.status, Some(409));
    }

    #[test]
    fn success_envelope_is_ok() {
        let response = HttpResponse::new(200, r#"{"isSuccess":true,"result":null}"#);
        assert!(client().parse_rent_item_by_qr(response).is_ok());
    }

    #[test]
    fn garbage_body_falls_back_to_default() {
        let response = HttpResponse::new(200, "<html>");
        let err = client().parse_rent_item_by_qr(response).unwrap_err();
        assert_eq!(err, RentalScanError::new(DEFAULT_RENTAL_ERROR_MESSAGE));
    }

    #[test]
    fn admin_history_normalization() {
        let row = normalize_admin_rental_history(&json!({
            "rentalHistoryId": 10,
            "itemCategory": {"id": 4},
            "categoryName": " 보조배터리 ",
            "studentName": "이학생",
            "studentCode": "20210001",
            "rentalStartAt": "2025-10-01T10:00:00",
            "rentalEndAt": "2025-10-08T10:00:00",
            "rentalStatus": "renting"
        }));
        assert_eq!(row.rental_history_id, Some(10));
        assert_eq!(row.item_category_id, Some(4));
        assert_eq!(row.item_category_name, "보조배터리");
        assert_eq!(row.item_name, UNKNOWN_ITEM_NAME);
        assert_eq!(row.renter_name, "이학생");
        assert_eq!(row.renter_student_id, "20210001");
        assert_eq!(row.rental_started_at.as_deref(), Some("2025-10-01T10:00:00"));
        assert_eq!(row.expected_return_at.as_deref(), Some("2025-10-08T10:00:00"));
        assert_eq!(row.rental_status, RentalStatus::InProgress);
    }

    #[test]
    fn admin_history_list_defaults() {
        let response = HttpResponse::new(200, r#"{"isSuccess":true,"result":null}"#);
        assert!(client().parse_admin_rental_histories(response).unwrap().is_empty());

        let response = HttpResponse::new(200, r#"{"isSuccess":true,"result":{"items":[7]}}"#);
        let rows = client().parse_admin_rental_histories(response).unwrap();
        assert_eq!(rows, vec![AdminRentalHistory::default()]);
    }

    #[test]
    fn manual_return_falls_through_to_second_path() {
        let mut flow = client().manual_return(3).unwrap();
        assert_eq!(flow.next_request().unwrap().url, "http://localhost:8080/admin/rentals/3/return");
        assert_eq!(flow.record(Ok(HttpResponse::new(404, ""))), ManualReturnStep::Continue);
        assert_eq!(flow.next_request().unwrap().url, "http://localhost:8080/admin/lockers/3/return");
        assert_eq!(
            flow.record(Ok(HttpResponse::new(200, r#"{"isSuccess":true}"#))),
            ManualReturnStep::Done(Ok(()))
        );
    }

    #[test]
    fn manual_return_stops_on_server_error() {
        let mut flow = client().manual_return(3).unwrap();
        let step = flow.record(Ok(HttpResponse::new(502, r#"{"message":"게이트웨이 오류"}"#)));
        let ManualReturnStep::Done(Err(err)) = step else {
            panic!("expected terminal failure, got {step:?}");
        };
        assert_eq!(err.status, Some(502));
        assert_eq!(err.message, "게이트웨이 오류");
    }

    #[test]
    fn manual_return_reports_last_error() {
        let mut flow = client().manual_return(3).unwrap();
        assert_eq!(flow.record(Err(TransportError::Timeout)), ManualReturnStep::Continue);
        let step = flow.record(Ok(HttpResponse::new(200, r#"{"isSuccess":false,"code":"ALREADY_RETURN"}"#)));
        assert_eq!(
            step,
            ManualReturnStep::Done(Err(RentalScanError::new(DEFAULT_RETURN_ERROR_MESSAGE)
                .with_code(Some(RentalErrorCode::AlreadyReturn))))
        );
        assert!(flow.next_request().is_none());
    }

    #[test]
    fn manual_return_rejects_bad_id() {
        assert_eq!(
            client().manual_return(0).unwrap_err(),
            RentalScanError::new(INVALID_RENTAL_HISTORY_MESSAGE)
        );
    }
}
