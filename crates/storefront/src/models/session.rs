//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use bazaar_core::{AuthToken, ConsumerId, ConsumerSession};

/// Session-stored consumer identity.
///
/// The backend's bearer token lives here and never reaches the browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConsumer {
    /// Consumer's backend ID.
    pub id: ConsumerId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Bearer token for backend calls made on the consumer's behalf.
    pub token: AuthToken,
}

impl From<ConsumerSession> for CurrentConsumer {
    fn from(session: ConsumerSession) -> Self {
        Self {
            id: session.consumer.id,
            name: session.consumer.name,
            email: session.consumer.email,
            token: session.token,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the logged-in consumer.
    pub const CURRENT_CONSUMER: &str = "current_consumer";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_consumer_session() {
        let session: ConsumerSession = serde_json::from_value(serde_json::json!({
            "token": "tok_123",
            "consumer": {"id": 9, "name": "Grace", "email": "grace@example.com"}
        }))
        .unwrap();
        let current = CurrentConsumer::from(session);
        assert_eq!(current.id.as_str(), "9");
        assert_eq!(current.token.expose(), "tok_123");
        assert!(!format!("{current:?}").contains("tok_123"));
    }
}
