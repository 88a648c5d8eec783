use axum::Json;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chrono::Utc;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::state::SharedState;
use crate::submission::pipeline;

pub const SERVICE_NAME: &str = "FMS Submission API";

pub async fn submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let result = pipeline::run(&state, &headers, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "FMS assessment request submitted successfully",
            "submissionId": result.submission_id,
            "nextSteps": {
                "contactWindow": "1 business day",
                "assessmentDuration": "45 minutes",
                "preparation": "Wear comfortable workout clothes",
            },
        })),
    )
        .into_response())
}

pub async fn health(State(state): State<SharedState>) -> Json<Value> {
    let limiter = &state.limiter;
    let current_connections = limiter.tracked().await;

    Json(json!({
        "service": SERVICE_NAME,
        "status": "operational",
        "timestamp": Utc::now().to_rfc3339(),
        "rateLimit": {
            "windowMs": limiter.window().as_millis() as u64,
            "maxRequests": limiter.max_requests(),
            "currentConnections": current_connections,
        },
    }))
}
