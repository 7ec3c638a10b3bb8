//! Authentication route handlers.
//!
//! Handles consumer login, registration and logout against the
//! marketplace backend. The backend's bearer token is kept in the session.

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

use crate::backend::Registration;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{PageContext, safe_next, set_current_consumer};
use crate::models::CurrentConsumer;
use crate::state::AppState;

/// Shortest accepted password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub password_confirm: String,
    pub next: Option<String>,
}

impl RegisterForm {
    /// Check the form before it is sent to the backend.
    ///
    /// # Errors
    ///
    /// Returns the message to show next to the form.
    pub fn validate(&self) -> Result<Registration, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Please enter your name.".to_string());
        }
        let email = Email::parse(&self.email).map_err(|_| "Please enter a valid email address.")?;
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters."
            ));
        }
        if self.password != self.password_confirm {
            return Err("Passwords do not match.".to_string());
        }

        Ok(Registration {
            name: name.to_string(),
            email: email.into_inner(),
            phone: self
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            password: SecretString::from(self.password.clone()),
        })
    }
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the login and registration pages.
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    /// Where to go after signing in.
    pub next: Option<String>,
    /// Set when the previous session's token was refused.
    pub expired: Option<u8>,
}

// =============================================================================
// Templates
// =============================================================================

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

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub next: String,
    pub error: Option<String>,
    pub min_password: usize,
}

impl RegisterTemplate {
    fn new(page: PageContext, form: &RegisterForm, error: Option<String>) -> Self {
        Self {
            page,
            name: form.name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone().unwrap_or_default(),
            next: safe_next(form.next.as_deref()).to_string(),
            error,
            min_password: MIN_PASSWORD_LENGTH,
        }
    }
}

/// Sign the consumer in and send them on.
async fn sign_in(
    session: &Session,
    consumer: CurrentConsumer,
    next: Option<&str>,
) -> Result<Response, tower_sessions::session::Error> {
    set_current_consumer(session, &consumer).await?;
    set_sentry_user(&consumer.id, Some(&consumer.email));
    tracing::info!(consumer_id = %consumer.id, "Consumer signed in");
    Ok(Redirect::to(safe_next(next)).into_response())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(page))]
pub async fn login_page(page: PageContext, Query(query): Query<AuthQuery>) -> impl IntoResponse {
    LoginTemplate {
        page,
        email: String::new(),
        next: safe_next(query.next.as_deref()).to_string(),
        error: None,
        expired: query.expired.is_some(),
    }
}

/// Handle login form submission.
///
/// A refusal shows the backend's own message (e.g. "Invalid email or
/// password") above the form.
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
    match state
        .marketplace()
        .login_consumer(email.as_str(), &password)
        .await
    {
        Ok(consumer_session) => {
            match sign_in(&session, consumer_session.into(), form.next.as_deref()).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to store consumer in session");
                    rerender(page, "We couldn't sign you in. Please try again.".to_string())
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            rerender(page, e.user_message())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(page))]
pub async fn register_page(page: PageContext, Query(query): Query<AuthQuery>) -> impl IntoResponse {
    let form = RegisterForm {
        next: query.next,
        ..RegisterForm::default()
    };
    RegisterTemplate::new(page, &form, None)
}

/// Handle registration form submission.
///
/// The backend signs the new consumer in straight away.
#[instrument(skip(state, page, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let rerender = |page, error: String| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            RegisterTemplate::new(page, &form, Some(error)),
        )
            .into_response()
    };

    let registration = match form.validate() {
        Ok(registration) => registration,
        Err(error) => return rerender(page, error),
    };

    match state.marketplace().register_consumer(&registration).await {
        Ok(consumer_session) => {
            match sign_in(&session, consumer_session.into(), form.next.as_deref()).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to store consumer in session");
                    Redirect::to("/login").into_response()
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            rerender(page, e.user_message())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "Failed to flush session on logout");
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}
