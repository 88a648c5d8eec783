use axum::extract::rejection::BytesRejection;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use serde_json::Value;

use crate::error::AppError;
use crate::notify::NotifyError;
use crate::state::SharedState;
use crate::verify::VERIFICATION_FAILED;

use super::fields;
use super::guard;
use super::metadata;
use super::Submission;

pub const RATE_LIMITED: &str = "Too many requests. Please wait before submitting again.";
pub const INVALID_REQUEST_FORMAT: &str = "Invalid request format";
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";

pub struct PipelineResult {
    pub submission_id: String,
}

/// Run one intake request through every stage. Any stage may short-circuit.
///
/// `body` is the buffered request body, or the rejection from buffering it.
/// A body over the transport cap surfaces here as 413 so it still passes the
/// origin and rate-limit stages first.
pub async fn run(
    state: &SharedState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<PipelineResult, AppError> {
    let config = &state.config;
    let env = config.environment;

    if !guard::origin_allowed(headers, env, &config.allowed_origins) {
        return Err(AppError::Forbidden(guard::INVALID_ORIGIN.to_string()));
    }

    let meta = metadata::extract(headers);

    if let Err(retry_after) = state.limiter.check(&meta.client_id).await {
        return Err(AppError::RateLimited {
            message: RATE_LIMITED.to_string(),
            retry_after,
        });
    }

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(guard::REQUEST_TOO_LARGE.to_string())
        } else {
            if !env.is_production() {
                tracing::debug!("Failed to read submission body: {rejection}");
            }
            AppError::BadRequest(INVALID_REQUEST_FORMAT.to_string())
        }
    })?;

    let raw: Value = serde_json::from_slice(&body).map_err(|e| {
        if !env.is_production() {
            tracing::debug!("Rejected malformed submission body: {e}");
        }
        AppError::BadRequest(INVALID_REQUEST_FORMAT.to_string())
    })?;

    if !guard::payload_within_limit(&raw, config.max_payload_bytes) {
        return Err(AppError::PayloadTooLarge(guard::REQUEST_TOO_LARGE.to_string()));
    }

    let request = fields::validate(&raw).map_err(|errors| {
        if !env.is_production() {
            tracing::debug!("Submission failed validation: {errors:?}");
        }
        AppError::Validation(errors)
    })?;

    if let Some(token) = request.turnstile_token.as_deref() {
        if !state.verifier.verify(token).await {
            return Err(AppError::BadRequest(VERIFICATION_FAILED.to_string()));
        }
    }

    let submission = Submission::build(request, meta);

    if env.is_development() {
        tracing::info!(
            id = %submission.id,
            name = %submission.name,
            email = %submission.email,
            submitted_at = %submission.submitted_at.to_rfc3339(),
            "FMS submission received"
        );
    }

    match state.notifier.notify(&submission).await {
        Ok(_) => {}
        Err(NotifyError::Declined { reason }) => {
            if !env.is_production() {
                tracing::warn!("Email notification failed: {reason}");
            }
        }
        Err(NotifyError::Faulted { cause }) => {
            tracing::error!(submission_id = %submission.id, "Email service fault: {cause}");
            return Err(AppError::Internal {
                message: UNEXPECTED_ERROR.to_string(),
                detail: (!env.is_production()).then_some(cause),
            });
        }
    }

    Ok(PipelineResult {
        submission_id: submission.id,
    })
}
