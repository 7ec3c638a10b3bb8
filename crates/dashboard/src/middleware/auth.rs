//! Authentication extractors for the dashboard.
//!
//! A merchant is signed in when the session holds a [`CurrentMerchant`].

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, Method, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentMerchant, session_keys};

/// Where signed-out merchants are sent.
pub const LOGIN_PATH: &str = "/login";

/// Whether the request was made by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

/// Send the browser to `location`, using `HX-Redirect` for HTMX requests.
#[must_use]
pub fn redirect_browser(htmx: bool, location: &str) -> Response {
    if htmx {
        (StatusCode::OK, [("HX-Redirect", location.to_string())]).into_response()
    } else {
        Redirect::to(location).into_response()
    }
}

/// Extractor that requires a signed-in merchant.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireMerchant(merchant): RequireMerchant) -> impl IntoResponse {
///     state.marketplace().my_orders(&merchant.token, filter).await
/// }
/// ```
pub struct RequireMerchant(pub CurrentMerchant);

/// Error returned when a merchant is required but nobody is signed in.
pub enum MerchantAuthRejection {
    /// Send the browser to the login page, then back to `next`.
    RedirectToLogin { htmx: bool, next: String },
    /// No session layer is installed.
    Unauthorized,
}

impl IntoResponse for MerchantAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { htmx, next } => {
                let location = if next == "/" {
                    LOGIN_PATH.to_string()
                } else {
                    format!("{LOGIN_PATH}?next={}", urlencoding::encode(&next))
                };
                redirect_browser(htmx, &location)
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireMerchant
where
    S: Send + Sync,
{
    type Rejection = MerchantAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(MerchantAuthRejection::Unauthorized)?;

        let merchant: Option<CurrentMerchant> = session
            .get(session_keys::CURRENT_MERCHANT)
            .await
            .ok()
            .flatten();

        merchant.map(Self).ok_or_else(|| {
            let htmx = is_htmx(&parts.headers);
            // Fragments and form posts make poor post-login destinations.
            let next = if htmx || parts.method != Method::GET {
                "/".to_string()
            } else {
                original_uri(parts)
                    .path_and_query()
                    .map_or_else(|| "/".to_string(), ToString::to_string)
            };
            MerchantAuthRejection::RedirectToLogin { htmx, next }
        })
    }
}

/// Extractor that optionally gets the signed-in merchant.
pub struct OptionalMerchant(pub Option<CurrentMerchant>);

impl<S> FromRequestParts<S> for OptionalMerchant
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let merchant = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentMerchant>(session_keys::CURRENT_MERCHANT)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(merchant))
    }
}

/// Store the signed-in merchant, cycling the session ID.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_merchant(
    session: &Session,
    merchant: &CurrentMerchant,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_MERCHANT, merchant)
        .await
}

/// Remove the signed-in merchant from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_merchant(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentMerchant>(session_keys::CURRENT_MERCHANT)
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
    use super::*;

    #[test]
    fn test_rejection_redirects() {
        let response = MerchantAuthRejection::RedirectToLogin {
            htmx: false,
            next: "/orders?status=pending".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/login?next=%2Forders%3Fstatus%3Dpending"
        );

        let response = MerchantAuthRejection::RedirectToLogin {
            htmx: true,
            next: "/".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["HX-Redirect"], "/login");
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/products")), "/products");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
