//! Newsletter subscription route handlers.
//!
//! The footer form posts here via HTMX and is replaced by the returned
//! fragment. An address that is already on the list is shown as subscribed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::IntoResponse};
use bazaar_core::Email;
use serde::Deserialize;
use tracing::instrument;

use crate::backend::SubscribeOutcome;
use crate::state::AppState;

/// Newsletter subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    pub email: String,
}

/// Success fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_success.html")]
pub struct SubscribeSuccessTemplate {
    pub email: String,
    pub already_subscribed: bool,
}

/// Error fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_error.html")]
pub struct SubscribeErrorTemplate {
    pub message: String,
    pub email: String,
}

/// Subscribe to newsletter (HTMX).
#[instrument(skip(state, form))]
pub async fn subscribe(
    State(state): State<AppState>,
    Form(form): Form<SubscribeForm>,
) -> impl IntoResponse {
    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(_) => {
            return SubscribeErrorTemplate {
                message: "Please enter a valid email address.".to_string(),
                email: form.email.trim().to_string(),
            }
            .into_response();
        }
    };

    match state.marketplace().subscribe_newsletter(&email).await {
        Ok(outcome) => {
            tracing::info!(?outcome, "Newsletter subscription recorded");
            SubscribeSuccessTemplate {
                email: email.into_inner(),
                already_subscribed: outcome == SubscribeOutcome::AlreadySubscribed,
            }
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Newsletter subscription failed");
            SubscribeErrorTemplate {
                message: e.user_message(),
                email: email.into_inner(),
            }
            .into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_fragment_mentions_existing_subscription() {
        let html = SubscribeSuccessTemplate {
            email: "ada@example.com".into(),
            already_subscribed: true,
        }
        .render()
        .unwrap();
        assert!(html.contains("already subscribed"));
        assert!(html.contains("ada@example.com"));
    }

    #[test]
    fn test_error_fragment_keeps_email() {
        let html = SubscribeErrorTemplate {
            message: "Please enter a valid email address.".into(),
            email: "nope".into(),
        }
        .render()
        .unwrap();
        assert!(html.contains(r#"value="nope""#));
    }
}
