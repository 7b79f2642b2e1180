//! Lenient accessors over raw server JSON.
//!
//! The backend renames fields between releases, so every normalizer reads
//! through these helpers instead of deserializing into strict structs.
//! None of them fail: a missing, null or mistyped field reads as `None`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

pub(crate) type Record = Map<String, Value>;

/// The value as an object, if it is one.
pub(crate) fn as_record(value: &Value) -> Option<&Record> {
    value.as_object()
}

/// First of `keys` whose value is present and not null.
///
/// Only presence counts: an empty string stops the search, mirroring how the
/// server's aliases were resolved historically.
pub(crate) fn coalesce<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

/// Trimmed, non-empty string content.
pub(crate) fn to_nullable_string(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Integral number, or a string that parses as one.
pub(crate) fn to_nullable_number(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && f.fract() == 0.0)
                        .map(|f| f as i64)
                })
        }
        _ => None,
    }
}

/// Strings and numbers rendered as text; used for identifiers that arrive
/// either way.
pub(crate) fn to_identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// JavaScript-style truthiness.
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Array items under `key`, or an empty slice.
pub(crate) fn array_field<'a>(record: &'a Record, key: &str) -> &'a [Value] {
    record
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Removes `null` entries from every object so `#[serde(default)]` fills
/// them in.
pub(crate) fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Deserialize a result payload whose fields may be null or missing.
///
/// Mistyped fields are only tolerated where the target type reads them
/// through a `lenient` helper.
pub(crate) fn decode_lenient<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(strip_nulls(value)).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Decode every row of a list result, skipping rows that still fail.
/// A non-array result is an empty list.
pub(crate) fn decode_rows<T: DeserializeOwned>(value: Value) -> Vec<T> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match decode_lenient(item) {
            Ok(row) => Some(row),
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed row");
                None
            }
        })
        .collect()
}

/// `deserialize_with` adapters that route DTO fields through the readers
/// above, so a mistyped field falls back to its default instead of failing
/// the whole payload.
pub(crate) mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{to_identifier, to_nullable_number};

    pub(crate) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        opt_number(d).map(Option::unwrap_or_default)
    }

    pub(crate) fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(to_nullable_number(Some(&value)))
    }

    /// Strings as sent, numbers rendered; anything else is empty.
    pub(crate) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
    }

    pub(crate) fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(to_identifier(Some(&value)))
    }

    /// Booleans, or the strings `"true"` / `"false"`.
    pub(crate) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(match value {
            Value::Bool(b) => b,
            Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        })
    }

    pub(crate) fn texts<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(value
            .as_array()
            .map(|items| items.iter().filter_map(|item| to_identifier(Some(item))).collect())
            .unwrap_or_default())
    }

    pub(crate) fn rows<'de, D: Deserializer<'de>, T: DeserializeOwned>(d: D) -> Result<Vec<T>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(super::decode_rows(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn coalesce_skips_null_and_missing() {
        let r = record(json!({"a": null, "c": 3}));
        assert_eq!(coalesce(&r, &["a", "b", "c"]), Some(&json!(3)));
        assert_eq!(coalesce(&r, &["a", "b"]), None);
    }

    #[test]
    fn coalesce_stops_at_empty_string() {
        let r = record(json!({"a": "", "b": "x"}));
        assert_eq!(coalesce(&r, &["a", "b"]), Some(&json!("")));
    }

    #[test]
    fn nullable_number_accepts_numeric_strings() {
        assert_eq!(to_nullable_number(Some(&json!("42"))), Some(42));
        assert_eq!(to_nullable_number(Some(&json!(" 7 "))), Some(7));
        assert_eq!(to_nullable_number(Some(&json!(3.0))), Some(3));
        assert_eq!(to_nullable_number(Some(&json!("abc"))), None);
        assert_eq!(to_nullable_number(Some(&json!(""))), None);
        assert_eq!(to_nullable_number(Some(&json!(true))), None);
        assert_eq!(to_nullable_number(Some(&Value::Null)), None);
        assert_eq!(to_nullable_number(None), None);
    }

    #[test]
    fn nullable_string_trims_and_drops_blank() {
        assert_eq!(to_nullable_string(Some(&json!("  hi "))), Some("hi".to_string()));
        assert_eq!(to_nullable_string(Some(&json!("   "))), None);
        assert_eq!(to_nullable_string(Some(&json!(5))), None);
    }

    #[test]
    fn identifier_renders_numbers() {
        assert_eq!(to_identifier(Some(&json!(20231234))), Some("20231234".to_string()));
        assert_eq!(to_identifier(Some(&json!("A-1"))), Some("A-1".to_string()));
        assert_eq!(to_identifier(Some(&json!(false))), None);
    }

    #[test]
    fn strip_nulls_recurses() {
        let stripped = strip_nulls(json!({"a": null, "b": [{"c": null, "d": 1}]}));
        assert_eq!(stripped, json!({"b": [{"d": 1}]}));
    }

    #[derive(Debug, Default, PartialEq, serde::Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    struct Row {
        #[serde(deserialize_with = "lenient::number")]
        row_id: i64,
        #[serde(deserialize_with = "lenient::opt_text")]
        student_id: Option<String>,
        #[serde(deserialize_with = "lenient::flag")]
        paid: bool,
    }

    #[test]
    fn lenient_fields_absorb_mistyped_values() {
        let rows: Vec<Row> = decode_rows(json!([
            {"rowId": 1, "studentId": 20201234, "paid": true},
            {"rowId": "7", "studentId": "A-1", "paid": "true"},
            {"rowId": {"nested": 1}, "studentId": false, "paid": 1},
        ]));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], Row { row_id: 1, student_id: Some("20201234".to_string()), paid: true });
        assert_eq!(rows[1], Row { row_id: 7, student_id: Some("A-1".to_string()), paid: true });
        assert_eq!(rows[2], Row::default());
    }

    #[test]
    fn rows_skip_non_objects_and_default_non_arrays() {
        let rows: Vec<Row> = decode_rows(json!([{"rowId": 2}, "junk", 5]));
        assert_eq!(rows, vec![Row { row_id: 2, ..Row::default() }]);
        assert!(decode_rows::<Row>(json!({"rowId": 2})).is_empty());
    }

    #[test]
    fn truthiness_matches_javascript() {
        assert!(truthy(Some(&json!(1))));
        assert!(truthy(Some(&json!("no"))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(None));
    }
}
