//! Request ID middleware for request tracing and correlation.
//!
//! Accepts an upstream `x-request-id` when it looks sane, otherwise mints a
//! UUID v4. The ID is recorded in the tracing span and the Sentry scope,
//! exposed to handlers as [`RequestId`] and echoed in the response.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderValue, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID accepted.
const MAX_REQUEST_ID_LENGTH: usize = 128;

/// The current request's ID.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Use the upstream ID if it is short and printable, else a fresh UUID.
fn resolve(upstream: Option<&HeaderValue>) -> String {
    upstream
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LENGTH
                && id.chars().all(|c| c.is_ascii_graphic())
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = resolve(request.headers().get(REQUEST_ID_HEADER));

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_else(|| Self(String::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_sane_upstream_id() {
        let header = HeaderValue::from_static("cf-ray-8a1b2c3d");
        assert_eq!(resolve(Some(&header)), "cf-ray-8a1b2c3d");
    }

    #[test]
    fn test_replaces_missing_or_odd_ids() {
        assert_eq!(resolve(None).len(), 36);
        let spaced = HeaderValue::from_static("has spaces inside");
        assert_eq!(resolve(Some(&spaced)).len(), 36);
        let long = HeaderValue::from_str(&"a".repeat(200)).ok();
        assert_eq!(resolve(long.as_ref()).len(), 36);
    }
}
