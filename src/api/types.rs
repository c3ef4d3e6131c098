//! API request and response types.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::ChatBridgeError;
use crate::session::SessionStatus;

/// Request to create a new session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    /// Caller-chosen session identifier.
    pub id: String,
}

/// Response for session creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub message: String,
    pub id: String,
}

impl CreateSessionResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            success: true,
            message: "session created".to_string(),
            id: id.into(),
        }
    }
}

/// Response for session status query.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub id: String,
    /// Lifecycle state name, e.g. "Open" or "AwaitingPairing".
    pub state: String,
    /// Whether the session is authenticated with a live connection.
    pub connected: bool,
}

impl StatusResponse {
    pub fn from_status(status: &SessionStatus) -> Self {
        Self {
            success: true,
            id: status.id.to_string(),
            state: format!("{:?}", status.state),
            connected: status.connected,
        }
    }
}

/// Response for session deletion.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteSessionResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteSessionResponse {
    pub fn new() -> Self {
        Self {
            success: true,
            message: "session deleted".to_string(),
        }
    }
}

impl Default for DeleteSessionResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Request to send a message through a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Session to send through.
    pub session_id: String,
    /// Recipient: a phone number in any formatting, or a full protocol
    /// address containing `@`.
    pub to: String,
    /// Message body.
    pub text: String,
}

/// Response for a sent message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
}

impl SendMessageResponse {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message: "message sent".to_string(),
            message_id: message_id.into(),
        }
    }
}

/// List sessions response.
#[derive(Debug, Clone, Serialize)]
pub struct ListSessionsResponse {
    pub success: bool,
    pub sessions: Vec<String>,
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// Error code (e.g., "SESSION_NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

/// Map a core error to its HTTP status and wire representation.
///
/// Each kind gets a meaningful status instead of a blanket 500: caller
/// mistakes are 4xx, upstream protocol failures are 502/504, and only
/// genuine internal faults fall through to 500.
pub fn error_response(err: &ChatBridgeError) -> (StatusCode, ErrorResponse) {
    use ChatBridgeError::*;

    let (status, code) = match err {
        SessionExists(_) => (StatusCode::BAD_REQUEST, "SESSION_EXISTS"),
        SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
        InvalidSessionId(_) => (StatusCode::BAD_REQUEST, "INVALID_SESSION_ID"),
        InvalidRecipient(_) => (StatusCode::BAD_REQUEST, "INVALID_RECIPIENT"),
        AuthInvalid(_) => (StatusCode::BAD_GATEWAY, "AUTH_INVALID"),
        Protocol(_) => (StatusCode::BAD_GATEWAY, "PROTOCOL_ERROR"),
        Timeout => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
        Store(_) | CredsDecode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };

    (status, ErrorResponse::new(code, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_session_request_parses() {
        let req: CreateSessionRequest = serde_json::from_str(r#"{"id": "tenant-a"}"#).unwrap();
        assert_eq!(req.id, "tenant-a");
    }

    #[test]
    fn test_send_message_request_camel_case() {
        let json = r#"{"sessionId": "tenant-a", "to": "+1 555 0100", "text": "hi"}"#;
        let req: SendMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.session_id, "tenant-a");
        assert_eq!(req.to, "+1 555 0100");
    }

    #[test]
    fn test_send_message_response_field_names() {
        let json = serde_json::to_string(&SendMessageResponse::new("3EB0AA")).unwrap();
        assert!(json.contains("messageId"));
        assert!(json.contains("3EB0AA"));
    }

    #[test]
    fn test_error_response_serialization() {
        let err = ErrorResponse::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("TEST_ERROR"));
        assert!(json.contains("Test message"));
        assert!(json.contains("\"success\":false"));
    }

    #[test]
    fn test_error_response_mapping() {
        let (status, body) = error_response(&ChatBridgeError::SessionExists("x".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "SESSION_EXISTS");

        let (status, _) = error_response(&ChatBridgeError::SessionNotFound("x".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = error_response(&ChatBridgeError::Protocol("down".into()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = error_response(&ChatBridgeError::Timeout);
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);

        let (status, _) = error_response(&ChatBridgeError::LockPoisoned);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
