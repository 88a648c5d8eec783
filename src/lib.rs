pub mod config;
pub mod error;
pub mod state;
pub mod notify;
pub mod rate_limit;
pub mod reaper;
pub mod routes;
pub mod submission;
pub mod verify;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::notify::EmailNotifier;
use crate::rate_limit::SubmissionRateLimiter;
use crate::state::{AppState, SharedState};
use crate::verify::TurnstileVerifier;

/// Wire the production collaborators from configuration.
pub fn build_state(config: Config) -> Result<SharedState, String> {
    let verifier = TurnstileVerifier::new(&config.turnstile, config.environment, config.outbound_timeout)?;
    if config.turnstile.secret.is_none() {
        tracing::warn!("TURNSTILE_SECRET_KEY not configured");
    }

    let notifier = EmailNotifier::from_config(&config.mail, config.outbound_timeout);
    let limiter = SubmissionRateLimiter::in_memory(&config.rate_limit);

    Ok(Arc::new(AppState {
        config,
        limiter: Arc::new(limiter),
        verifier: Arc::new(verifier),
        notifier: Arc::new(notifier),
    }))
}

pub fn build_app(state: SharedState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let max_body_size = state.config.max_body_size;

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    Router::new()
        .merge(routes::intake_routes().layer(cors))
        .route("/health", axum::routing::get(health))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(security_headers)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
