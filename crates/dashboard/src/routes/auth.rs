//! Merchant login and logout.
//!
//! The backend's merchant token is stored in the dashboard session; the
//! browser only ever sees the session cookie.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::Email;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalMerchant, PageContext, safe_next, set_current_merchant};
use crate::models::CurrentMerchant;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    /// Set when the previous session's token was refused.
    pub expired: Option<u8>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
    pub next: String,
    pub error: Option<String>,
    pub expired: bool,
}

/// Display the login page, or skip it when already signed in.
#[instrument(skip(page, merchant))]
pub async fn login_page(
    page: PageContext,
    OptionalMerchant(merchant): OptionalMerchant,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref()).to_string();
    if merchant.is_some() && query.expired.is_none() {
        return Redirect::to(&next).into_response();
    }

    LoginTemplate {
        page,
        email: String::new(),
        next,
        error: None,
        expired: query.expired.is_some(),
    }
    .into_response()
}

/// Handle login form submission.
///
/// A refusal shows the backend's own message above the form.
#[instrument(skip(state, page, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let rerender = |page, error: String| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginTemplate {
                page,
                email: form.email.clone(),
                next: safe_next(form.next.as_deref()).to_string(),
                error: Some(error),
                expired: false,
            },
        )
            .into_response()
    };

    let Ok(email) = Email::parse(&form.email) else {
        return rerender(page, "Please enter a valid email address.".to_string());
    };
    if form.password.is_empty() {
        return rerender(page, "Please enter your password.".to_string());
    }

    let password = SecretString::from(form.password.clone());
    let merchant: CurrentMerchant = match state
        .marketplace()
        .login_merchant(email.as_str(), &password)
        .await
    {
        Ok(merchant_session) => merchant_session.into(),
        Err(e) => {
            tracing::warn!(error = %e, "Merchant login failed");
            return rerender(page, e.user_message());
        }
    };

    if let Err(e) = set_current_merchant(&session, &merchant).await {
        tracing::error!(error = %e, "Failed to store merchant in session");
        return rerender(page, "We couldn't sign you in. Please try again.".to_string());
    }
    set_sentry_user(&merchant.id, Some(&merchant.email));
    tracing::info!(merchant_id = %merchant.id, "Merchant signed in");

    Redirect::to(safe_next(form.next.as_deref())).into_response()
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "Failed to flush session on logout");
    }
    clear_sentry_user();

    Redirect::to("/login").into_response()
}
