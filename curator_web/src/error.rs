//! Error Types
//!
//! Everything a handler can fail with, and how each failure reaches the
//! client. Not-found style errors answer 404 without detail. Anything else is
//! logged with a backtrace and answered with a bare 500.

use std::backtrace::Backtrace;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::database::DatabaseError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad identifier: {0:?}")]
    BadIdentifier(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadIdentifier(_) | AppError::Database(DatabaseError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Database(_) | AppError::Template(_) | AppError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let trace = failure_trace();
            tracing::error!(error = %self, backtrace = %trace, "Request failed");
        } else {
            tracing::debug!(error = %self, "Answering not found");
        }

        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}

/// Always walks the stack, whatever `RUST_BACKTRACE` says.
fn failure_trace() -> Backtrace {
    Backtrace::force_capture()
}

/// Parse an id taken from the URL. Only positive integers are ids.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadIdentifier(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::backtrace::BacktraceStatus;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(matches!(parse_id("0"), Err(AppError::BadIdentifier(_))));
        assert!(matches!(parse_id("-3"), Err(AppError::BadIdentifier(_))));
        assert!(matches!(parse_id("abc"), Err(AppError::BadIdentifier(_))));
        assert!(matches!(parse_id(""), Err(AppError::BadIdentifier(_))));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::BadIdentifier("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(DatabaseError::NotFound("Source 1".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(DatabaseError::Query(sqlx::Error::PoolTimedOut)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_serialization_failure_is_a_server_error() {
        let err = serde_json::from_str::<Vec<i64>>("[1,").unwrap_err();
        assert_eq!(
            AppError::from(err).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_failure_trace_ignores_backtrace_env() {
        // SAFETY: no other test in this crate reads or writes these variables.
        unsafe {
            std::env::remove_var("RUST_BACKTRACE");
            std::env::remove_var("RUST_LIB_BACKTRACE");
        }
        assert_eq!(failure_trace().status(), BacktraceStatus::Captured);
    }

    #[test]
    fn test_server_error_hides_detail() {
        let response =
            AppError::from(DatabaseError::Connection(sqlx::Error::PoolClosed)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
