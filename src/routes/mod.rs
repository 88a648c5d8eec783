pub mod intake;

use axum::Router;
use axum::routing::post;

use crate::state::SharedState;

pub fn intake_routes() -> Router<SharedState> {
    Router::new().route("/api/fms/submit", post(intake::submit).get(intake::health))
}
