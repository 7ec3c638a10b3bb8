//! The signed-in merchant, as kept in the session.

use serde::{Deserialize, Serialize};

use bazaar_core::{AuthToken, MerchantId, MerchantSession, StoreId};

/// Session-stored merchant identity.
///
/// The backend's bearer token lives here and never reaches the browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentMerchant {
    pub id: MerchantId,
    pub name: String,
    pub email: String,
    /// Store the merchant manages, when the backend reports one.
    pub store_id: Option<StoreId>,
    /// Bearer token for backend calls made on the merchant's behalf.
    pub token: AuthToken,
}

impl From<MerchantSession> for CurrentMerchant {
    fn from(session: MerchantSession) -> Self {
        Self {
            id: session.merchant.id,
            name: session.merchant.name,
            email: session.merchant.email,
            store_id: session.merchant.store_id,
            token: session.token,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    pub const CURRENT_MERCHANT: &str = "current_merchant";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_merchant_session() {
        let session: MerchantSession = serde_json::from_value(serde_json::json!({
            "token": "mtok_1",
            "merchant": {"id": 4, "name": "Lin", "email": "lin@example.com", "storeId": 12}
        }))
        .unwrap();
        let current = CurrentMerchant::from(session);
        assert_eq!(current.store_id, Some(StoreId::new("12")));
        assert_eq!(current.token.expose(), "mtok_1");
        assert!(!format!("{current:?}").contains("mtok_1"));
    }
}
