use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::evaluation::AdapterError;
use crate::labels::UnknownLabel;
use crate::scoring::InvalidScoreError;
use crate::store::StoreError;
use crate::workflow::InvalidTransitionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid score: {0}")]
    InvalidScore(#[from] InvalidScoreError),

    #[error("Invalid transition: {0}")]
    InvalidTransition(#[from] InvalidTransitionError),

    #[error("Evaluation failed: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => AppError::NotFound(e.to_string()),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Corrupt(msg) => AppError::Internal(anyhow::anyhow!(msg)),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

/// A stored enum label the service doesn't recognise is a data problem, not a
/// client error.
impl From<UnknownLabel> for AppError {
    fn from(e: UnknownLabel) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidScore(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidTransition(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Adapter(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidScore(_) => "INVALID_SCORE",
            AppError::InvalidTransition(_) => "INVALID_TRANSITION",
            AppError::Adapter(_) => "ADAPTER_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// `{"code", "message", ...details}`, as used in single and bulk responses.
    pub fn body(&self) -> Value {
        let mut body = json!({
            "code": self.code(),
            "message": self.public_message(),
        });
        let details = match self {
            AppError::InvalidScore(e) => json!({ "field": e.field, "min": e.min, "max": e.max }),
            AppError::InvalidTransition(e) => json!({
                "machine": e.machine,
                "from": e.from,
                "event": e.event,
            }),
            AppError::Adapter(e) => json!({ "retryable": e.retryable() }),
            _ => Value::Null,
        };
        if let (Some(obj), Value::Object(extra)) = (body.as_object_mut(), details) {
            obj.extend(extra);
        }
        body
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "A database error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            AppError::Adapter(e) => {
                tracing::warn!(retryable = e.retryable(), "Adapter error: {e}");
                e.to_string()
            }
            AppError::InvalidScore(e) => e.to_string(),
            AppError::InvalidTransition(e) => e.to_string(),
            AppError::NotFound(msg) | AppError::Conflict(msg) | AppError::Validation(msg) => {
                msg.clone()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.body() }));
        (self.status(), body).into_response()
    }
}
