//! Error handling for dashboard handlers.
//!
//! Handlers return `Result<T, AppError>`. Server-side failures are captured
//! to Sentry; a backend `401` marks the response so the session expiry
//! middleware signs the merchant out.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::ApiError;
use crate::filters;
use crate::middleware::{PageContext, SessionExpired};

/// Application-level error type for the dashboard.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Marketplace error: {0}")]
    Api(#[from] ApiError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub page: PageContext,
    pub status: u16,
    pub title: &'static str,
    pub message: String,
}

impl AppError {
    /// HTTP status for the error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Api(err) => match err {
                ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                ApiError::Api { status, .. } if *status < 500 => StatusCode::BAD_REQUEST,
                ApiError::Rejected(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show to the merchant.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            Self::Session(_) | Self::Internal(_) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
            Self::NotFound(what) => format!("We couldn't find {what}."),
            Self::BadRequest(message) => message.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Request error");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let title = match status {
            StatusCode::NOT_FOUND => "Not found",
            StatusCode::UNAUTHORIZED => "Please sign in",
            StatusCode::TOO_MANY_REQUESTS => "Slow down",
            StatusCode::BAD_REQUEST => "Request refused",
            StatusCode::BAD_GATEWAY => "Marketplace unavailable",
            _ => "Something went wrong",
        };

        let mut response = (
            status,
            ErrorTemplate {
                page: PageContext::default(),
                status: status.as_u16(),
                title,
                message: self.public_message(),
            },
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.extensions_mut().insert(SessionExpired);
        }

        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Associate subsequent Sentry events with the merchant.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::from(ApiError::NotFound("order".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ApiError::Api {
                status: 422,
                message: "Cannot move a delivered order".into()
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ApiError::Api {
                status: 500,
                message: String::new()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_unauthorized_marks_session_expired() {
        let response = AppError::from(ApiError::Unauthorized("expired".into())).into_response();
        assert!(response.extensions().get::<SessionExpired>().is_some());
    }
}
