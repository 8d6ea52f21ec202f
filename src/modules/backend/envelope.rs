//! Backend response envelopes.
//!
//! Every backend response looks like `{success, data | entity-fields, error: {code, message}}`.
//! Some endpoints wrap their payload in `data`, others put named fields at the top
//! level (`{success, services: [...]}`), and a few return bare arrays. This module
//! turns all of those into either a payload `Value` or an `AppError::Backend`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::error::AppError;

/// Fallback message when the backend gives us nothing to show
const GENERIC_FAILURE: &str = "Request failed";

/// Error details extracted from a failed envelope
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeError {
    pub code: Option<String>,
    pub message: String,
}

impl EnvelopeError {
    pub fn into_app_error(self, status: u16) -> AppError {
        AppError::Backend {
            status,
            code: self.code,
            message: self.message,
        }
    }
}

/// Best-effort extraction of `{error: {code, message}}`, `{error: "..."}` or `{message}`
pub fn extract_error(body: &Value) -> EnvelopeError {
    let error = body.get("error");

    let code = error
        .and_then(|e| e.get("code"))
        .and_then(|c| match c {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| error.and_then(Value::as_str))
        .or_else(|| body.get("message").and_then(Value::as_str))
        .or_else(|| body.get("detail").and_then(Value::as_str))
        .map(str::to_string)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());

    EnvelopeError { code, message }
}

/// Split a response body into payload or failure.
///
/// `success: false` is a failure regardless of HTTP status. A missing `success`
/// field is treated as success (bare payloads).
pub fn unwrap_envelope(status: u16, body: Value) -> Result<Value, AppError> {
    let explicit_failure = body.get("success").and_then(Value::as_bool) == Some(false);
    let http_failure = !(200..300).contains(&status);

    if explicit_failure || http_failure {
        // A success:false with a 2xx status is still a client-visible failure
        let status = if http_failure { status } else { 400 };
        return Err(extract_error(&body).into_app_error(status));
    }

    Ok(body)
}

/// Pull the payload out of a successful envelope.
///
/// Lookup order: `data.<key>`, top-level `<key>`, `data`, then the whole body
/// minus the envelope bookkeeping fields.
pub fn payload(body: Value, key: Option<&str>) -> Value {
    let mut body = body;

    if let Some(key) = key {
        if let Some(found) = body
            .get_mut("data")
            .and_then(|d| d.get_mut(key))
            .map(Value::take)
        {
            return found;
        }
        if let Some(found) = body.get_mut(key).map(Value::take) {
            return found;
        }
    }

    if let Some(data) = body.get_mut("data") {
        if !data.is_null() {
            return data.take();
        }
    }

    if let Value::Object(ref mut map) = body {
        map.remove("success");
        map.remove("message");
        map.remove("error");
    }
    body
}

/// Deserialize a payload into a typed value, reporting shape mismatches as
/// backend contract errors
pub fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| {
        tracing::error!("Failed to decode backend {}: {}", what, e);
        AppError::ExternalServiceError(format!("Unexpected {} payload: {}", what, e))
    })
}

/// Total count for list responses, wherever the backend chose to put it
pub fn total_count(body: &Value) -> Option<i64> {
    let candidates = [
        body.pointer("/data/total"),
        body.pointer("/data/pagination/total"),
        body.pointer("/pagination/total"),
        body.pointer("/meta/total"),
        body.get("total"),
        body.get("count"),
    ];
    candidates.into_iter().flatten().find_map(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_false_becomes_backend_error_with_message() {
        let err = unwrap_envelope(
            200,
            json!({"success": false, "error": {"code": "SLOT_FULL", "message": "Slot is full"}}),
        )
        .unwrap_err();

        match err {
            AppError::Backend {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("SLOT_FULL"));
                assert_eq!(message, "Slot is full");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_http_failure_without_envelope_uses_generic_message() {
        let err = unwrap_envelope(503, json!(null)).unwrap_err();
        assert!(matches!(
            err,
            AppError::Backend { status: 503, ref message, .. } if message == GENERIC_FAILURE
        ));
    }

    #[test]
    fn test_error_as_plain_string() {
        let err = extract_error(&json!({"success": false, "error": "Invalid credentials"}));
        assert_eq!(err.message, "Invalid credentials");
        assert_eq!(err.code, None);
    }

    #[test]
    fn test_payload_lookup_order() {
        let nested = json!({"success": true, "data": {"services": [1, 2]}});
        assert_eq!(payload(nested, Some("services")), json!([1, 2]));

        let top = json!({"success": true, "services": [3]});
        assert_eq!(payload(top, Some("services")), json!([3]));

        let data = json!({"success": true, "data": [4]});
        assert_eq!(payload(data, Some("services")), json!([4]));

        let fields = json!({"success": true, "appointmentId": "A1", "confirmation": "C"});
        assert_eq!(
            payload(fields, None),
            json!({"appointmentId": "A1", "confirmation": "C"})
        );
    }

    #[test]
    fn test_total_count_locations() {
        assert_eq!(total_count(&json!({"data": {"total": 12}})), Some(12));
        assert_eq!(total_count(&json!({"pagination": {"total": 3}})), Some(3));
        assert_eq!(total_count(&json!({"data": []})), None);
    }
}
