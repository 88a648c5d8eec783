use axum::http::HeaderMap;
use serde_json::Value;

use crate::config::Environment;

/// Header that forces production origin checks outside production.
pub const TEST_PRODUCTION_HEADER: &str = "x-test-production-mode";

pub const INVALID_ORIGIN: &str = "Invalid origin";
pub const REQUEST_TOO_LARGE: &str = "Request too large";

/// Returns false when the request must be rejected as cross-origin.
///
/// Only browser requests carry `origin`; requests without one are trusted.
pub fn origin_allowed(headers: &HeaderMap, environment: Environment, allowed: &[String]) -> bool {
    let forced = headers
        .get(TEST_PRODUCTION_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true");

    if !environment.is_production() && !forced {
        return true;
    }

    let Some(origin) = headers.get("origin") else {
        return true;
    };
    // Present but not visible ASCII can never match the allow-list.
    let Ok(origin) = origin.to_str() else {
        return false;
    };

    allowed.iter().any(|prefix| origin.starts_with(prefix.as_str()))
}

/// Size of the body re-serialized from its parsed form, in bytes.
pub fn payload_size(body: &Value) -> usize {
    serde_json::to_string(body).map(|s| s.len()).unwrap_or(usize::MAX)
}

pub fn payload_within_limit(body: &Value, limit: usize) -> bool {
    payload_size(body) <= limit
}
