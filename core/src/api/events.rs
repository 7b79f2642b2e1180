//! Notices and calendar events.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::INVALID_RESPONSE_MESSAGE;
use crate::client::CouncilClient;
use crate::error::ApiError;
use crate::http::{FormPart, HttpMethod, HttpRequest, HttpResponse};
use crate::value::{decode_lenient, decode_rows, lenient, to_nullable_number};

/// A calendar entry as listed by `GET /events`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventInfo {
    #[serde(deserialize_with = "lenient::number")]
    pub event_id: i64,
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub event_created_at: String,
    #[serde(deserialize_with = "lenient::text")]
    pub event_start_date: String,
    #[serde(deserialize_with = "lenient::text")]
    pub event_end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDetail {
    #[serde(deserialize_with = "lenient::number")]
    pub event_id: i64,
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub content: String,
    #[serde(deserialize_with = "lenient::text")]
    pub event_start_date: String,
    #[serde(deserialize_with = "lenient::text")]
    pub event_end_date: String,
    #[serde(deserialize_with = "lenient::text")]
    pub event_created_at: String,
    #[serde(deserialize_with = "lenient::texts")]
    pub image_urls: Vec<String>,
}

/// Optional `yyyy-MM-dd` bounds for the event list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub content: String,
    pub event_start_date: String,
    pub event_end_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_end_date: Option<String>,
}

/// A picked image to attach to a new event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventImage {
    pub uri: String,
    pub name: Option<String>,
    pub mime_type: Option<String>,
}

impl CouncilClient {
    pub fn build_list_events(&self, range: &EventRange) -> HttpRequest {
        let mut query = Vec::new();
        if let Some(from) = range.from.as_deref() {
            query.push(("from", from));
        }
        if let Some(to) = range.to.as_deref() {
            query.push(("to", to));
        }
        self.request(HttpMethod::Get, "/events", &query)
    }

    pub fn parse_list_events(&self, response: HttpResponse) -> Result<Vec<EventInfo>, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        Ok(decode_rows(result))
    }

    pub fn build_get_event(&self, event_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/events/{event_id}"), &[])
    }

    pub fn parse_get_event(&self, response: HttpResponse) -> Result<EventDetail, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        decode_lenient(result)
    }

    /// Multipart upload: the event as a JSON part plus one `image` part per
    /// picture.
    pub fn build_create_event(&self, event: &NewEvent, images: &[EventImage]) -> Result<HttpRequest, ApiError> {
        let dto = serde_json::to_string(event).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut parts = vec![FormPart::Text {
            name: "eventAddRequestDTO".to_string(),
            value: dto,
            content_type: Some("application/json".to_string()),
        }];
        parts.extend(images.iter().enumerate().map(|(idx, img)| FormPart::File {
            name: "image".to_string(),
            uri: img.uri.clone(),
            file_name: img.name.clone().unwrap_or_else(|| format!("image-{}.jpg", idx + 1)),
            content_type: img.mime_type.clone().unwrap_or_else(|| "image/jpeg".to_string()),
        }));
        Ok(self.multipart_request(HttpMethod::Post, "/admin/events", parts))
    }

    pub fn parse_create_event(&self, response: HttpResponse) -> Result<i64, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        event_id_of(&result)
    }

    pub fn build_update_event(&self, event_id: i64, update: &EventUpdate) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/admin/events/{event_id}"), &[], update)
    }

    pub fn parse_update_event(&self, response: HttpResponse) -> Result<i64, ApiError> {
        let result = self.envelope(&response)?.require_result(INVALID_RESPONSE_MESSAGE)?;
        event_id_of(&result)
    }

    pub fn build_delete_event(&self, event_id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/admin/events/{event_id}"), &[])
    }

    pub fn parse_delete_event(&self, response: HttpResponse) -> Result<(), ApiError> {
        self.envelope_or_empty(&response)?
            .reject_explicit_failure("공지를 삭제하지 못했습니다.")
    }
}

fn event_id_of(result: &serde_json::Value) -> Result<i64, ApiError> {
    to_nullable_number(result.get("eventId"))
        .ok_or_else(|| ApiError::DeserializationError(format!("missing eventId in {result}")))
}

/// `"2025-10-19T12:34:56"` → `"2025-10-19"`; empty when absent.
pub fn to_ymd_from_datetime(iso: Option<&str>) -> String {
    iso.map(|s| s.chars().take(10).collect()).unwrap_or_default()
}

/// Normalize a date or timestamp to `yyyy-MM-dd`.
///
/// RFC 3339 timestamps are converted to UTC first; naive timestamps are taken
/// as-is.
pub fn to_ymd(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.naive_utc().date().format("%Y-%m-%d").to_string());
    }
    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|ts| ts.date().format("%Y-%m-%d").to_string())
}
