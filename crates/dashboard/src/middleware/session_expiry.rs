//! Sign the merchant out when the backend refuses their token.
//!
//! A backend `401` becomes an [`AppError`](crate::error::AppError) whose
//! response carries [`SessionExpired`]; this middleware drops the merchant
//! from the session and sends the browser to the login page.

use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

use super::auth::{clear_current_merchant, is_htmx, redirect_browser};

/// Where an expired session lands.
pub const EXPIRED_LOGIN_PATH: &str = "/login?expired=1";

/// Response extension set when the backend rejected the merchant's token.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Middleware turning [`SessionExpired`] responses into a sign-out redirect.
pub async fn session_expiry_middleware(session: Session, request: Request, next: Next) -> Response {
    let htmx = is_htmx(request.headers());
    let response = next.run(request).await;

    if response.extensions().get::<SessionExpired>().is_none() {
        return response;
    }

    tracing::info!("Backend rejected merchant token, signing out");
    if let Err(e) = clear_current_merchant(&session).await {
        tracing::error!(error = %e, "Failed to clear expired merchant from session");
    }
    crate::error::clear_sentry_user();

    redirect_browser(htmx, EXPIRED_LOGIN_PATH)
}
