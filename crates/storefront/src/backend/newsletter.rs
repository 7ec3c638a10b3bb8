//! Newsletter subscription.

use bazaar_core::Email;
use bazaar_core::api::ApiError;
use serde::Serialize;
use tracing::instrument;

use super::Marketplace;

#[derive(Serialize)]
struct Subscribe<'a> {
    email: &'a str,
}

/// Result of a subscription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
}

impl Marketplace {
    /// Subscribe an email address to the marketplace newsletter.
    ///
    /// A backend answer saying the address is already on the list counts as
    /// success.
    ///
    /// # Errors
    ///
    /// Returns an error for any other failure.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn subscribe_newsletter(&self, email: &Email) -> Result<SubscribeOutcome, ApiError> {
        match self
            .inner
            .api
            .post_unit(
                &["newsletter", "subscribe"],
                &Subscribe {
                    email: email.as_str(),
                },
                None,
            )
            .await
        {
            Ok(message) if message.as_deref().is_some_and(is_already_subscribed) => {
                Ok(SubscribeOutcome::AlreadySubscribed)
            }
            Ok(_) => Ok(SubscribeOutcome::Subscribed),
            Err(ApiError::Api { status: 409, .. }) => Ok(SubscribeOutcome::AlreadySubscribed),
            Err(ApiError::Api { message, .. } | ApiError::Rejected(message))
                if is_already_subscribed(&message) =>
            {
                Ok(SubscribeOutcome::AlreadySubscribed)
            }
            Err(e) => Err(e),
        }
    }
}

fn is_already_subscribed(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("already subscribed")
        || message.contains("already exists")
        || message.contains("already been taken")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_subscribed_detection() {
        assert!(is_already_subscribed("Email is already subscribed"));
        assert!(is_already_subscribed("Subscriber ALREADY EXISTS"));
        assert!(!is_already_subscribed("Invalid email"));
    }
}
