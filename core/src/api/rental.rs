//! Student-side rentals: QR token issuance and the caller's rental records.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::INVALID_RESPONSE_MESSAGE;
use crate::client::CouncilClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::value::{array_field, as_record, coalesce, to_nullable_number, to_nullable_string, Record};

pub const UNKNOWN_ITEM_NAME: &str = "알 수 없는 물품";

/// How long a generated QR code stays on screen.
pub const QR_DISPLAY_SECONDS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalQrToken {
    pub qr_token: String,
    pub student_fee_paid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RentalStatus {
    InProgress,
    Overdue,
    Returned,
    Cancelled,
}

/// Canonical rental status. Anything unrecognized, including non-strings, is
/// `InProgress`.
pub fn normalize_rental_status(value: Option<&Value>) -> RentalStatus {
    let Some(raw) = value.and_then(Value::as_str) else {
        return RentalStatus::InProgress;
    };
    match raw.trim().to_ascii_uppercase().as_str() {
        "OVERDUE" => RentalStatus::Overdue,
        "RETURNED" | "COMPLETED" => RentalStatus::Returned,
        "CANCELLED" | "CANCELED" => RentalStatus::Cancelled,
        _ => RentalStatus::InProgress,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRentalItem {
    pub rental_history_id: Option<i64>,
    pub item_category_id: Option<i64>,
    pub item_name: String,
    pub rental_started_at: Option<String>,
    pub expected_return_at: Option<String>,
    pub returned_at: Option<String>,
    pub rental_status: RentalStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRentalInfo {
    pub expected_blacklist_until: Option<String>,
    pub items: Vec<MemberRentalItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalHistoryItem {
    pub rental_history_id: Option<i64>,
    pub item_name: String,
    pub rental_started_at: Option<String>,
    pub expected_return_at: Option<String>,
    pub returned_at: Option<String>,
    pub rental_status: RentalStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalHistoryInfo {
    pub items: Vec<RentalHistoryItem>,
}

fn normalize_member_rental_item(input: &Value) -> MemberRentalItem {
    let Some(record) = as_record(input) else {
        return MemberRentalItem {
            rental_history_id: None,
            item_category_id: None,
            item_name: UNKNOWN_ITEM_NAME.to_string(),
            rental_started_at: None,
            expected_return_at: None,
            returned_at: None,
            rental_status: RentalStatus::InProgress,
        };
    };
    let history = normalize_history_fields(record);
    MemberRentalItem {
        rental_history_id: history.rental_history_id,
        item_category_id: to_nullable_number(record.get("itemCategoryId")),
        item_name: history.item_name,
        rental_started_at: history.rental_started_at,
        expected_return_at: history.expected_return_at,
        returned_at: history.returned_at,
        rental_status: history.rental_status,
    }
}

fn normalize_history_fields(record: &Record) -> RentalHistoryItem {
    RentalHistoryItem {
        rental_history_id: to_nullable_number(record.get("rentalHistoryId")),
        item_name: to_nullable_string(record.get("itemName")).unwrap_or_else(|| UNKNOWN_ITEM_NAME.to_string()),
        rental_started_at: to_nullable_string(record.get("rentalStartedAt")),
        expected_return_at: to_nullable_string(coalesce(record, &["expectedReturnAt", "returnDueDate"])),
        returned_at: to_nullable_string(record.get("returnedAt")),
        rental_status: normalize_rental_status(record.get("rentalStatus")),
    }
}

fn normalize_rental_history_item(input: &Value) -> RentalHistoryItem {
    match as_record(input) {
        Some(record) => normalize_history_fields(record),
        None => RentalHistoryItem {
            rental_history_id: None,
            item_name: UNKNOWN_ITEM_NAME.to_string(),
            rental_started_at: None,
            expected_return_at: None,
            returned_at: None,
            rental_status: RentalStatus::InProgress,
        },
    }
}

pub fn normalize_member_rental_info(input: Option<&Value>) -> MemberRentalInfo {
    let Some(record) = input.and_then(as_record) else {
        return MemberRentalInfo::default();
    };
    MemberRentalInfo {
        expected_blacklist_until: to_nullable_string(record.get("expectedBlacklistUntil")),
        items: array_field(record, "items").iter().map(normalize_member_rental_item).collect(),
    }
}

pub fn normalize_rental_history_info(input: Option<&Value>) -> RentalHistoryInfo {
    let Some(record) = input.and_then(as_record) else {
        return RentalHistoryInfo::default();
    };
    RentalHistoryInfo {
        items: array_field(record, "items").iter().map(normalize_rental_history_item).collect(),
    }
}

/// On-screen lifetime of a generated QR code.
///
/// The server decides real expiry; this only drives the countdown and the
/// prompt to regenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrCountdown {
    issued_at: Instant,
    lifetime: Duration,
}

impl QrCountdown {
    pub fn start(issued_at: Instant) -> Self {
        Self {
            issued_at,
            lifetime: Duration::from_secs(QR_DISPLAY_SECONDS),
        }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.lifetime.saturating_sub(now.saturating_duration_since(self.issued_at))
    }

    /// Whole seconds left, rounded up, as the countdown label shows them.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let remaining = self.remaining(now);
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }
}

impl CouncilClient {
    pub fn build_generate_rental_qr_token(&self, item_category_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/rentals/{item_category_id}/qr-tokens"), &[])
    }

    /// `studentFeePaid`, else the older `feePaid`, else unpaid.
    pub fn parse_generate_rental_qr_token(&self, response: HttpResponse) -> Result<RentalQrToken, ApiError> {
        let (qr_token, record) = self.qr_token_result(&response)?;
        let student_fee_paid = record
            .get("studentFeePaid")
            .and_then(Value::as_bool)
            .or_else(|| record.get("feePaid").and_then(Value::as_bool))
            .unwrap_or(false);
        Ok(RentalQrToken {
            qr_token,
            student_fee_paid,
        })
    }

    pub fn build_generate_return_qr_token(&self, rental_history_id: i64) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/rentals/{rental_history_id}/return/qr-tokens"),
            &[],
        )
    }

    /// Returns are allowed regardless of fee status, so an absent flag reads
    /// as paid.
    pub fn parse_generate_return_qr_token(&self, response: HttpResponse) -> Result<RentalQrToken, ApiError> {
        let (qr_token, record) = self.qr_token_result(&response)?;
        Ok(RentalQrToken {
            qr_token,
            student_fee_paid: record.get("studentFeePaid").and_then(Value::as_bool).unwrap_or(true),
        })
    }

    fn qr_token_result(&self, response: &HttpResponse) -> Result<(String, Record), ApiError> {
        let envelope = self.envelope(response)?;
        let failure = || {
            ApiError::envelope(
                envelope
                    .message
                    .clone()
                    .unwrap_or_else(|| INVALID_RESPONSE_MESSAGE.to_string()),
            )
        };
        let record = envelope.result.as_ref().and_then(as_record).ok_or_else(failure)?;
        let qr_token = record
            .get("qrToken")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(failure)?;
        Ok((qr_token.to_string(), record.clone()))
    }

    pub fn build_member_rental_status(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/rentals/me", &[])
    }

    pub fn parse_member_rental_status(&self, response: HttpResponse) -> Result<MemberRentalInfo, ApiError> {
        let result = self.envelope(&response)?.optional_result();
        Ok(normalize_member_rental_info(result.as_ref()))
    }

    pub fn build_member_rental_history(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/rentals/me/history", &[])
    }

    pub fn parse_member_rental_history(&self, response: HttpResponse) -> Result<RentalHistoryInfo, ApiError> {
        let result = self.envelope(&response)?.optional_result();
        Ok(normalize_rental_history_info(result.as_ref()))
    }
}
