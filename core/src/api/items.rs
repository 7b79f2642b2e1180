//! Rentable item categories and the council's inventory view.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::CouncilClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::value::{array_field, as_record, to_nullable_number, to_nullable_string, truthy};

use super::rental::UNKNOWN_ITEM_NAME;

pub const UNNAMED_CATEGORY: &str = "이름 미확인";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCategorySummary {
    pub item_category_id: i64,
    pub item_category_name: String,
    pub total_count: i64,
    /// Always within `0..=total_count`.
    pub available_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminItemDetail {
    pub item_id: i64,
    pub rented: bool,
    pub category_name: String,
}

pub fn normalize_item_category(raw: &Value) -> ItemCategorySummary {
    let Some(record) = as_record(raw) else {
        return ItemCategorySummary {
            item_category_id: 0,
            item_category_name: UNKNOWN_ITEM_NAME.to_string(),
            total_count: 0,
            available_count: 0,
        };
    };
    let total_count = to_nullable_number(record.get("totalCount")).unwrap_or(0).max(0);
    let available_count = to_nullable_number(record.get("availableCount"))
        .unwrap_or(0)
        .clamp(0, total_count);
    ItemCategorySummary {
        item_category_id: to_nullable_number(record.get("itemCategoryId")).unwrap_or(0),
        item_category_name: to_nullable_string(record.get("itemCategoryName"))
            .unwrap_or_else(|| UNNAMED_CATEGORY.to_string()),
        total_count,
        available_count,
    }
}

pub fn normalize_admin_item(raw: &Value, fallback_name: &str) -> AdminItemDetail {
    let Some(record) = as_record(raw) else {
        return AdminItemDetail {
            item_id: 0,
            rented: false,
            category_name: fallback_name.to_string(),
        };
    };
    let rented = match record.get("rented") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        other => truthy(other),
    };
    AdminItemDetail {
        item_id: to_nullable_number(record.get("ItemId")).unwrap_or(0),
        rented,
        category_name: to_nullable_string(record.get("categoryName")).unwrap_or_else(|| fallback_name.to_string()),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IncreaseQuantityBody {
    category_id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewCategoryBody<'a> {
    category_name: &'a str,
}

impl CouncilClient {
    /// Categories a student can rent.
    pub fn build_available_items(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/items", &[])
    }

    /// Same listing from the council side.
    pub fn build_admin_available_items(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/admin/items", &[])
    }

    /// Parses either category listing; a missing result is an empty list.
    pub fn parse_item_categories(&self, response: HttpResponse) -> Result<Vec<ItemCategorySummary>, ApiError> {
        let result = self.envelope(&response)?.optional_result();
        Ok(result
            .as_ref()
            .and_then(as_record)
            .map(|r| array_field(r, "itemCategoryInfos").iter().map(normalize_item_category).collect())
            .unwrap_or_default())
    }

    pub fn build_admin_items_by_category(&self, category_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/admin/items/{category_id}"), &[])
    }

    pub fn parse_admin_items_by_category(
        &self,
        response: HttpResponse,
        fallback_name: Option<&str>,
    ) -> Result<Vec<AdminItemDetail>, ApiError> {
        let fallback_name = fallback_name.unwrap_or(UNKNOWN_ITEM_NAME);
        let result = self.envelope(&response)?.optional_result();
        Ok(result
            .as_ref()
            .and_then(as_record)
            .map(|r| {
                array_field(r, "items")
                    .iter()
                    .map(|raw| normalize_admin_item(raw, fallback_name))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Adds one unit to a category's stock.
    pub fn build_increase_item_quantity(&self, category_id: i64) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Patch, "/admin/items", &[], &IncreaseQuantityBody { category_id })
    }

    pub fn parse_increase_item_quantity(&self, response: HttpResponse) -> Result<(), ApiError> {
        self.envelope(&response)?.require_success("물품 수량을 증가시키지 못했습니다.")
    }

    pub fn build_create_item_category(&self, name: &str) -> Result<HttpRequest, ApiError> {
        let category_name = name.trim();
        if category_name.is_empty() {
            return Err(ApiError::InvalidInput("대여 물품명을 입력해주세요.".to_string()));
        }
        self.json_request(HttpMethod::Post, "/admin/item-categories", &[], &NewCategoryBody { category_name })
    }

    /// The new category's id.
    pub fn parse_create_item_category(&self, response: HttpResponse) -> Result<i64, ApiError> {
        let envelope = self.envelope(&response)?;
        if !envelope.succeeded() {
            return Err(ApiError::envelope(
                envelope.message.unwrap_or_else(|| "물품 종류를 추가하지 못했습니다.".to_string()),
            ));
        }
        envelope
            .result
            .as_ref()
            .and_then(|r| to_nullable_number(r.get("categoryId")))
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::envelope("생성된 물품 정보가 올바르지 않습니다."))
    }
}
