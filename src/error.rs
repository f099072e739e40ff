use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::sink::SinkError;
use crate::submission::schema::FieldErrors;
use crate::submission::{FAILURE_MESSAGE, RATE_LIMITED_MESSAGE};

#[derive(Debug)]
pub enum AppError {
    Validation(FieldErrors),
    BadRequest(String),
    RateLimited(u64),
    Sink(SinkError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation failed: {errors}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::RateLimited(secs) => write!(f, "Rate Limited: retry after {secs}s"),
            AppError::Sink(err) => write!(f, "{err}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                tracing::debug!("Rejected submission: {errors}");
                (
                    StatusCode::BAD_REQUEST,
                    axum::Json(json!({ "message": FAILURE_MESSAGE, "errors": errors })),
                )
                    .into_response()
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Undecodable submission: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(json!({ "message": FAILURE_MESSAGE })),
                )
                    .into_response()
            }
            AppError::RateLimited(secs) => {
                tracing::warn!("Submission rate limited, retry after {secs}s");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, secs.to_string())],
                    axum::Json(json!({ "message": RATE_LIMITED_MESSAGE })),
                )
                    .into_response()
            }
            AppError::Sink(err) => {
                tracing::error!("Error submitting evaluation: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(json!({ "message": FAILURE_MESSAGE })),
                )
                    .into_response()
            }
        }
    }
}

impl From<SinkError> for AppError {
    fn from(err: SinkError) -> Self {
        AppError::Sink(err)
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}
