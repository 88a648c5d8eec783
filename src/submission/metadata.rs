use axum::http::HeaderMap;

use crate::rate_limit::UNKNOWN_CLIENT;

/// Request-derived metadata attached to an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub client_id: String,
    pub user_agent: String,
}

/// Extract submission metadata from request headers.
pub fn extract(headers: &HeaderMap) -> RequestMeta {
    RequestMeta {
        client_id: client_id(headers),
        user_agent: header_str(headers, "user-agent").unwrap_or("unknown").to_string(),
    }
}

/// Rate-limit key: `x-forwarded-for` verbatim, else `x-real-ip`, else the
/// shared `unknown` bucket.
// TODO: callers behind a proxy that strips both headers all share the
// `unknown` bucket; needs a product decision before keying on the peer address.
pub fn client_id(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .or_else(|| header_str(headers, "x-real-ip"))
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}
