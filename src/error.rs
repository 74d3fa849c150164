use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Failures the relay distinguishes.
///
/// Inbound-path variants (`MediaFetchFailure`, `BackendUnreachable`) are
/// logged and swallowed. Outbound-path variants (`InvalidAddress`,
/// `MediaDecodeFailure`, `TransportSendFailure`) are returned to the HTTP
/// caller as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("media decode failure: {0}")]
    MediaDecodeFailure(String),

    #[error("transport send failure: {0}")]
    TransportSendFailure(String),

    #[error("backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("media fetch failure: {0}")]
    MediaFetchFailure(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MalformedRequest(_)
            | RelayError::InvalidAddress(_)
            | RelayError::MediaDecodeFailure(_) => StatusCode::BAD_REQUEST,
            RelayError::TransportSendFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::BackendUnreachable(_) | RelayError::MediaFetchFailure(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<JsonRejection> for RelayError {
    fn from(rejection: JsonRejection) -> Self {
        RelayError::MalformedRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_errors_are_bad_request() {
        assert_eq!(
            RelayError::InvalidAddress("empty".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::MediaDecodeFailure("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::MalformedRequest("not json".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_send_failure_keeps_underlying_message() {
        let err = RelayError::TransportSendFailure("chat not found".into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("chat not found"));
    }
}
