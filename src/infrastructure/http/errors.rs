//! Mapping of HTTP failures onto `ApiError`.

use reqwest::StatusCode;
use serde_json::Value;

use crate::domain::ports::ApiError;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Pull a human message out of an error body: `message`, then `error`,
/// then the raw text.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(msg)) = map.get(key) {
                if !msg.is_empty() {
                    return msg.clone();
                }
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )
    } else {
        trimmed.to_string()
    }
}

/// Classify a non-success response.
pub fn from_status(status: StatusCode, body: &str) -> ApiError {
    let message = error_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ApiError::Timeout,
        s if s.is_server_error() => ApiError::Server {
            status: s.as_u16(),
            message,
        },
        s => ApiError::Rejected {
            status: s.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_preferred() {
        let msg = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Invalid credentials","error":"Bad Request"}"#,
        );
        assert_eq!(msg, "Invalid credentials");
    }

    #[test]
    fn test_error_field_fallback() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"error":"XML malformed"}"#);
        assert_eq!(msg, "XML malformed");
    }

    #[test]
    fn test_plain_text_and_empty_bodies() {
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down\n"), "upstream down");
        assert_eq!(
            error_message(StatusCode::SERVICE_UNAVAILABLE, ""),
            "HTTP 503: Service Unavailable"
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ApiError::Server { status: 500, .. }
        ));
        assert!(matches!(
            from_status(StatusCode::NOT_FOUND, ""),
            ApiError::Rejected { status: 404, .. }
        ));
        assert!(from_status(StatusCode::GATEWAY_TIMEOUT, "").is_transient());
    }
}
