//! Request-path errors and their HTTP mapping.
//!
//! Startup and background work use `anyhow`; handlers return [`AppError`] so
//! client mistakes and store failures map to distinct status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidRange(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Query timed out")]
    Timeout,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // ---
        let (status, message) = match self {
            AppError::InvalidRange(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Timeout => {
                tracing::error!("History query exceeded its timeout");
                (StatusCode::GATEWAY_TIMEOUT, "Query timed out".to_string())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_status_codes() {
        // ---
        let bad = AppError::InvalidRange("'from' must be earlier than 'to'".into()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let db = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            AppError::Timeout.into_response().status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
