//! Authentication extractors.
//!
//! A consumer is signed in when the session holds a [`CurrentConsumer`],
//! which carries the backend's bearer token.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentConsumer, session_keys};

/// Header HTMX sets on every request it makes.
const HX_REQUEST: &str = "hx-request";

/// Whether the request was made by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .is_some_and(|v| v.as_bytes() == b"true")
}

/// Send the browser to `location`.
///
/// HTMX requests get an `HX-Redirect` header so the whole page navigates
/// instead of swapping the login page into a fragment.
#[must_use]
pub fn redirect_browser(htmx: bool, location: &str) -> Response {
    if htmx {
        (StatusCode::OK, [("HX-Redirect", location.to_string())]).into_response()
    } else {
        Redirect::to(location).into_response()
    }
}

/// Extractor that requires a signed-in consumer.
///
/// If nobody is signed in, redirects to `/login?next=<path>`.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireConsumer(consumer): RequireConsumer) -> impl IntoResponse {
///     state.marketplace().orders(&consumer.token, 1).await
/// }
/// ```
pub struct RequireConsumer(pub CurrentConsumer);

/// Rejection when a consumer is required but nobody is signed in.
pub struct LoginRequired {
    htmx: bool,
    next: String,
}

impl IntoResponse for LoginRequired {
    fn into_response(self) -> Response {
        let location = format!("/login?next={}", urlencoding::encode(&self.next));
        redirect_browser(self.htmx, &location)
    }
}

impl<S> FromRequestParts<S> for RequireConsumer
where
    S: Send + Sync,
{
    type Rejection = LoginRequired;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalConsumer(consumer) = match OptionalConsumer::from_request_parts(parts, state).await {
            Ok(consumer) => consumer,
            Err(never) => match never {},
        };

        consumer.map(Self).ok_or_else(|| {
            let htmx = is_htmx(&parts.headers);
            // A fragment URL is useless as a post-login destination.
            let next = if htmx || parts.method != axum::http::Method::GET {
                "/".to_string()
            } else {
                original_uri(parts)
                    .path_and_query()
                    .map_or_else(|| "/".to_string(), ToString::to_string)
            };
            LoginRequired { htmx, next }
        })
    }
}

/// Extractor that optionally gets the signed-in consumer.
pub struct OptionalConsumer(pub Option<CurrentConsumer>);

impl<S> FromRequestParts<S> for OptionalConsumer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let consumer = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentConsumer>(session_keys::CURRENT_CONSUMER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(consumer))
    }
}

/// Store the signed-in consumer in the session.
///
/// Cycles the session ID to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_consumer(
    session: &Session,
    consumer: &CurrentConsumer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_CONSUMER, consumer)
        .await
}

/// Remove the signed-in consumer from the session (logout, expired token).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_consumer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentConsumer>(session_keys::CURRENT_CONSUMER)
        .await?;
    Ok(())
}

/// Only same-site paths are accepted as post-login destinations.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}


/// The request URI before any `nest` prefix was stripped.
pub(crate) fn original_uri(parts: &Parts) -> &axum::http::Uri {
    parts
        .extensions
        .get::<axum::extract::OriginalUri>()
        .map_or(&parts.uri, |original| &original.0)
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert(HX_REQUEST, HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }

    #[test]
    fn test_redirect_browser() {
        let response = redirect_browser(true, "/login");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["HX-Redirect"], "/login");

        let response = redirect_browser(false, "/login");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/orders/5")), "/orders/5");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn test_login_required_keeps_next() {
        let response = LoginRequired {
            htmx: false,
            next: "/orders?page=2".to_string(),
        }
        .into_response();
        assert_eq!(
            response.headers()["location"],
            "/login?next=%2Forders%3Fpage%3D2"
        );
    }
}
