//! Response envelope and structured error payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{FAIL, INVALID_COMMAND, SUCCESS};

/// Classes of failure reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No handle is open for the switch.
    NotConnected,
    /// A handle is already open for the switch.
    AlreadyConnected,
    /// The switch did not answer.
    NoResponse,
    /// The switch does not support the requested port or mode.
    Unsupported,
    /// The operation did not finish within its bound.
    Timeout,
    /// Any other device failure.
    Device,
    /// An error kind this build does not know about.
    #[serde(other)]
    Other,
}

/// Structured error carried in a response's `data` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Failure class.
    pub error: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Response sent from the request server to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Result payload: a string, a list, or an object.
    pub data: Value,
}

impl Response {
    /// Wraps an arbitrary JSON payload.
    #[must_use]
    pub const fn from_value(data: Value) -> Self {
        Self { data }
    }

    /// Builds a textual response.
    #[must_use]
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            data: Value::String(data.into()),
        }
    }

    /// Builds the `success` response.
    #[must_use]
    pub fn success() -> Self {
        Self::text(SUCCESS)
    }

    /// Builds the `fail` response.
    #[must_use]
    pub fn fail() -> Self {
        Self::text(FAIL)
    }

    /// Builds the `Invalid command` response.
    #[must_use]
    pub fn invalid_command() -> Self {
        Self::text(INVALID_COMMAND)
    }

    /// Builds a structured error response.
    #[must_use]
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        let payload = ErrorPayload {
            error: kind,
            message: message.into(),
        };
        let data = serde_json::to_value(payload).unwrap_or(Value::Null);
        Self { data }
    }

    /// Returns the payload as text, if it is a string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.data.as_str()
    }

    /// Returns the structured error, if the payload carries one.
    #[must_use]
    pub fn error_payload(&self) -> Option<ErrorPayload> {
        if !self.data.is_object() {
            return None;
        }
        ErrorPayload::deserialize(&self.data).ok()
    }

    /// Returns `true` for the `Invalid command` payload.
    #[must_use]
    pub fn is_invalid_command(&self) -> bool {
        self.as_text() == Some(INVALID_COMMAND)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_responses_round_trip_through_json() {
        let response = Response::error(ErrorKind::NotConnected, "switch COM7 is not connected");
        let text = serde_json::to_string(&response).expect("serialise");
        let decoded: Response = serde_json::from_str(&text).expect("parse");
        let payload = decoded.error_payload().expect("error payload");
        assert_eq!(payload.error, ErrorKind::NotConnected);
        assert!(payload.message.contains("COM7"));
    }

    #[test]
    fn unknown_error_kinds_decode_as_other() {
        let response = Response::from_value(json!({"error":"overheated","message":"hot"}));
        let payload = response.error_payload().expect("error payload");
        assert_eq!(payload.error, ErrorKind::Other);
    }

    #[test]
    fn plain_objects_are_not_errors() {
        let response = Response::from_value(json!({"port": 1, "speed": "SS1"}));
        assert!(response.error_payload().is_none());
    }

    #[test]
    fn invalid_command_is_recognised() {
        assert!(Response::invalid_command().is_invalid_command());
        assert!(!Response::success().is_invalid_command());
    }
}
