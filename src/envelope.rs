//! Every game server response is wrapped either as `{"data": ...}` or as
//! `{"error": {"code", "message", "data"?}}`. This module sorts responses into
//! one or the other, and reports anything else as unrecognized.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::signaller::{RawResponse, SignalError};

/// An error reported by the game server. Keys besides `code`, `message` and `data`
/// are carried along in `extra`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ApiError {
    #[serde(default, deserialize_with = "lenient_code")]
    pub code: i64,
    #[serde(default, deserialize_with = "lenient_message")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Codes sent as strings or floats are still read; anything else is 0
fn lenient_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

fn lenient_message<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl ApiError {
    /// First validation reason from `data: {field: [reason, ...]}`, in the order the server listed them
    pub fn first_reason(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .as_object()?
            .values()
            .find_map(|reasons| reasons.get(0)?.as_str())
    }

    pub fn summary(&self) -> String {
        match self.first_reason() {
            Some(reason) => format!("{} (code {}): {}", self.message, self.code, reason),
            None => format!("{} (code {})", self.message, self.code),
        }
    }
}

/// Why a call did not produce the data that was asked for
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Fault {
    #[error("{}", .0.summary())]
    Api(ApiError),
    #[error("unrecognized response (status {status}): {body}")]
    Unrecognized { status: u16, body: String },
    #[error(transparent)]
    Signal(#[from] SignalError),
}

impl Fault {
    pub fn unrecognized(response: &RawResponse) -> Self {
        Fault::Unrecognized {
            status: response.status,
            body: response.text.chars().take(200).collect(),
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Fault::Api(error) => Some(error),
            _ => None,
        }
    }
}

/// The `error` envelope of a response, if it carries one
pub fn api_error(response: &RawResponse) -> Option<ApiError> {
    match response.body.get("error")? {
        Value::String(message) => Some(ApiError {
            message: message.clone(),
            ..ApiError::default()
        }),
        error @ Value::Object(_) => serde_json::from_value(error.clone()).ok(),
        _ => None,
    }
}

/// Unwraps `data` from a successful response
pub fn classify(response: &RawResponse) -> Result<&Value, Fault> {
    if response.is_success() {
        if let Some(data) = response.body.get("data") {
            return Ok(data);
        }
    }
    Err(failure(response))
}

/// For endpoints that answer without the `data` envelope
pub fn classify_bare(response: &RawResponse) -> Result<&Value, Fault> {
    if response.is_success() && response.body.is_object() {
        return Ok(&response.body);
    }
    Err(failure(response))
}

fn failure(response: &RawResponse) -> Fault {
    match api_error(response) {
        Some(error) => Fault::Api(error),
        None => Fault::unrecognized(response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registration_failure() -> ApiError {
        ApiError {
            code: 422,
            message: "Request could not be processed due to an invalid payload.".to_string(),
            data: Some(json!({"symbol": ["Agent symbol has already been claimed."]})),
            extra: Map::new(),
        }
    }

    #[test]
    fn data_is_unwrapped() {
        let response = RawResponse::from_json(200, json!({"data": [1, 2]}));
        assert_eq!(classify(&response).unwrap(), &json!([1, 2]));
    }

    #[test]
    fn error_envelope_is_api_fault() {
        let response = RawResponse::from_json(
            401,
            json!({"error": {"message": "A failed response", "code": 4103}}),
        );
        assert_eq!(
            classify(&response).unwrap_err(),
            Fault::Api(ApiError {
                code: 4103,
                message: "A failed response".to_string(),
                data: None,
                extra: Map::new(),
            })
        );
    }

    #[test]
    fn empty_server_error_is_unrecognized() {
        let response = RawResponse::new(500, String::new());
        assert_eq!(
            classify(&response).unwrap_err(),
            Fault::Unrecognized {
                status: 500,
                body: String::new()
            }
        );
    }

    #[test]
    fn success_without_data_is_unrecognized() {
        let response = RawResponse::from_json(200, json!({"status": "ok"}));
        assert!(matches!(
            classify(&response),
            Err(Fault::Unrecognized { status: 200, .. })
        ));
        assert_eq!(classify_bare(&response).unwrap(), &json!({"status": "ok"}));
    }

    #[test]
    fn validation_reasons() {
        let error = registration_failure();
        assert_eq!(
            error.data.as_ref().unwrap()["symbol"][0],
            "Agent symbol has already been claimed."
        );
        assert_eq!(
            error.first_reason(),
            Some("Agent symbol has already been claimed.")
        );
        assert_eq!(
            error.summary(),
            "Request could not be processed due to an invalid payload. (code 422): Agent symbol has already been claimed."
        );
    }

    #[test]
    fn summary_without_reasons() {
        let error = ApiError {
            code: 4103,
            message: "Failed to parse token.".to_string(),
            data: Some(json!({"reason": "expired"})),
            ..ApiError::default()
        };
        assert_eq!(error.first_reason(), None);
        assert_eq!(error.summary(), "Failed to parse token. (code 4103)");
        assert_eq!(Fault::Api(error).to_string(), "Failed to parse token. (code 4103)");
    }

    #[test]
    fn irregular_error_envelopes_are_still_api_faults() {
        let response = RawResponse::from_json(
            400,
            json!({"error": {"code": "4204", "requestId": "abc-123"}}),
        );
        let error = classify(&response).unwrap_err().api_error().cloned().unwrap();
        assert_eq!(error.code, 4204);
        assert_eq!(error.message, "");
        assert_eq!(error.extra["requestId"], "abc-123");

        let response = RawResponse::from_json(503, json!({"error": "Down for maintenance"}));
        let error = classify(&response).unwrap_err().api_error().cloned().unwrap();
        assert_eq!(error.message, "Down for maintenance");
        assert_eq!(error.code, 0);

        let response = RawResponse::from_json(500, json!({"error": [1, 2]}));
        assert!(matches!(
            classify(&response),
            Err(Fault::Unrecognized { status: 500, .. })
        ));
    }

    #[test]
    fn api_error_round_trips_verbatim() {
        let raw = json!({
            "message": "Request could not be processed due to an invalid payload.",
            "code": 422,
            "data": {"symbol": ["Agent symbol has already been claimed."]}
        });
        let error: ApiError = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(error, registration_failure());
        assert_eq!(serde_json::to_value(&error).unwrap(), raw);

        let raw = json!({"message": "Slow down", "code": 429, "requestId": "r-1", "retryAfter": 2});
        let error: ApiError = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(error.extra.len(), 2);
        assert_eq!(serde_json::to_value(&error).unwrap(), raw);
    }
}
