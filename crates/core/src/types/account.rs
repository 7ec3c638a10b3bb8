//! Consumer and merchant accounts, and consumer addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AddressId, AuthToken, ConsumerId, MerchantId, StoreId, ZoneId};

/// A consumer's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerProfile {
    pub id: ConsumerId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response to a consumer login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerSession {
    pub token: AuthToken,
    pub consumer: ConsumerProfile,
}

/// A merchant account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
    pub id: MerchantId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub store_id: Option<StoreId>,
}

/// Response to a merchant login.
#[derive(Debug, Clone, Deserialize)]
pub struct MerchantSession {
    pub token: AuthToken,
    pub merchant: Merchant,
}

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(default)]
    pub label: Option<String>,
    pub recipient_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    /// Delivery zone the address falls in, when the consumer picked one.
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Single-line rendering for selects and summaries.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2);
        }
        parts.push(self.city.as_str());
        parts.join(", ")
    }
}

/// Address fields sent when creating or updating an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub recipient_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_default: bool,
}
