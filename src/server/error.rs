//! Maps crate errors onto HTTP responses.
//!
//! Every error body is `{"detail": "..."}`. Internal failures are logged
//! with their cause and answered with a generic message.

use crate::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

impl Error {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::OperationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message for this error.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidInput(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::ServiceUnavailable(msg) => msg,
            Self::OperationFailed { .. } => "Internal server error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::OperationFailed { operation, cause } => {
                tracing::error!(operation = %operation, cause = %cause, "Request failed");
            },
            Self::ServiceUnavailable(msg) => tracing::warn!(detail = %msg, "Service unavailable"),
            _ => tracing::debug!(status = status.as_u16(), detail = self.detail(), "Request rejected"),
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST; "invalid input")]
    #[test_case(Error::Unauthorized("x".into()), StatusCode::UNAUTHORIZED; "unauthorized")]
    #[test_case(Error::Forbidden("x".into()), StatusCode::FORBIDDEN; "forbidden")]
    #[test_case(Error::NotFound("x".into()), StatusCode::NOT_FOUND; "not found")]
    #[test_case(Error::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE; "unavailable")]
    #[test_case(Error::failed("op", "boom"), StatusCode::INTERNAL_SERVER_ERROR; "failed")]
    fn test_status_mapping(err: Error, expected: StatusCode) {
        assert_eq!(err.into_response().status(), expected);
    }

    #[test]
    fn test_internal_cause_is_hidden() {
        let err = Error::failed("sqlite_query", "disk I/O error at /secret/path");
        assert_eq!(err.detail(), "Internal server error");
        assert_eq!(Error::NotFound("Page not found".into()).detail(), "Page not found");
    }
}
