//! The `{ isSuccess, result, message, code, errorCode }` wrapper every
//! endpoint answers with.

use serde_json::Value;

use crate::error::ApiError;
use crate::value::to_nullable_string;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub is_success: Option<bool>,
    pub result: Option<Value>,
    pub message: Option<String>,
    pub code: Option<String>,
    pub error_code: Option<String>,
    pub status: Option<String>,
}

impl Envelope {
    /// Strict parse: the body must be a JSON object.
    pub fn parse(body: &str) -> Result<Self, ApiError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        if !value.is_object() {
            return Err(ApiError::DeserializationError("response envelope is not an object".to_string()));
        }
        Ok(Self::from_value(value))
    }

    /// Best-effort parse for error bodies, which may be empty or plain text.
    pub fn lenient(body: &str) -> Self {
        serde_json::from_str::<Value>(body)
            .ok()
            .filter(Value::is_object)
            .map(Self::from_value)
            .unwrap_or_default()
    }

    fn from_value(mut value: Value) -> Self {
        let Some(record) = value.as_object_mut() else {
            return Self::default();
        };
        let result = record.remove("result").filter(|v| !v.is_null());
        Self {
            is_success: record.get("isSuccess").and_then(Value::as_bool),
            result,
            message: to_nullable_string(record.get("message")),
            code: to_nullable_string(record.get("code")),
            error_code: to_nullable_string(record.get("errorCode")),
            status: to_nullable_string(record.get("status")),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.is_success == Some(true)
    }

    fn failure(&self, default_message: &str) -> ApiError {
        ApiError::envelope(self.message.clone().unwrap_or_else(|| default_message.to_string()))
    }

    /// `result`, failing when `isSuccess` is not true or the result is absent.
    pub fn require_result(self, default_message: &str) -> Result<Value, ApiError> {
        if !self.succeeded() {
            return Err(self.failure(default_message));
        }
        match self.result {
            Some(result) => Ok(result),
            None => Err(self.failure(default_message)),
        }
    }

    /// `result` regardless of `isSuccess`; absent reads as `None`.
    pub fn optional_result(self) -> Option<Value> {
        self.result
    }

    /// Fails unless `isSuccess` is true.
    pub fn require_success(self, default_message: &str) -> Result<(), ApiError> {
        if self.succeeded() {
            Ok(())
        } else {
            Err(self.failure(default_message))
        }
    }

    /// Fails only when the server explicitly reported `isSuccess: false`.
    pub fn reject_explicit_failure(self, default_message: &str) -> Result<(), ApiError> {
        if self.is_success == Some(false) {
            Err(self.failure(default_message))
        } else {
            Ok(())
        }
    }
}
