use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::submission::fields::FieldError;

#[derive(Debug)]
pub enum AppError {
    Forbidden(String),
    RateLimited { message: String, retry_after: u64 },
    PayloadTooLarge(String),
    BadRequest(String),
    Validation(Vec<FieldError>),
    Internal { message: String, detail: Option<String> },
}

pub const VALIDATION_FAILED: &str = "Form validation failed";

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::RateLimited { message, retry_after } => {
                write!(f, "Rate Limited: {message} (retry after {retry_after}s)")
            }
            AppError::PayloadTooLarge(msg) => write!(f, "Payload Too Large: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Validation(errors) => {
                write!(f, "{VALIDATION_FAILED}: {} error(s)", errors.len())
            }
            AppError::Internal { message, detail } => match detail {
                Some(detail) => write!(f, "Internal Error: {message} ({detail})"),
                None => write!(f, "Internal Error: {message}"),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Forbidden(msg) => failure(StatusCode::FORBIDDEN, &msg),
            AppError::RateLimited { message, retry_after } => {
                let mut response = failure(StatusCode::TOO_MANY_REQUESTS, &message);
                if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
            AppError::PayloadTooLarge(msg) => failure(StatusCode::PAYLOAD_TOO_LARGE, &msg),
            AppError::BadRequest(msg) => failure(StatusCode::BAD_REQUEST, &msg),
            AppError::Validation(errors) => {
                let body = json!({
                    "success": false,
                    "message": VALIDATION_FAILED,
                    "errors": errors,
                });
                (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
            }
            AppError::Internal { message, detail } => {
                let mut body = json!({ "success": false, "message": message });
                // Only populated outside production.
                if let Some(detail) = detail {
                    body["error"] = json!(detail);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
            }
        }
    }
}

fn failure(status: StatusCode, message: &str) -> Response {
    let body = json!({ "success": false, "message": message });
    (status, axum::Json(body)).into_response()
}
