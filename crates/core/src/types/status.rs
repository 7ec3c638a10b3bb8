//! Order status and the badge shown for it.
//!
//! The backend owns the order lifecycle; these values are only read and
//! displayed, plus sent back verbatim when a merchant picks a new status.

use serde::{Deserialize, Serialize};

/// Order status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    #[serde(alias = "processing")]
    Preparing,
    #[serde(alias = "ready_for_pickup")]
    Ready,
    #[serde(alias = "shipped", alias = "in_transit")]
    OutForDelivery,
    Delivered,
    #[serde(alias = "canceled")]
    Cancelled,
    /// A status this build does not know about yet.
    #[serde(other)]
    Unknown,
}

/// Colour family of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Neutral,
    Info,
    Warning,
    Success,
    Danger,
}

impl BadgeTone {
    /// CSS class for the badge.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Neutral => "badge badge-neutral",
            Self::Info => "badge badge-info",
            Self::Warning => "badge badge-warning",
            Self::Success => "badge badge-success",
            Self::Danger => "badge badge-danger",
        }
    }
}

/// Label and tone for rendering an order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub tone: BadgeTone,
}

impl StatusBadge {
    /// CSS class for the badge.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        self.tone.css_class()
    }
}

impl OrderStatus {
    /// Every known status in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire value of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        self.badge().label
    }

    /// Badge for the status.
    #[must_use]
    pub const fn badge(self) -> StatusBadge {
        let (label, tone) = match self {
            Self::Pending => ("Pending", BadgeTone::Warning),
            Self::Confirmed => ("Confirmed", BadgeTone::Info),
            Self::Preparing => ("Preparing", BadgeTone::Info),
            Self::Ready => ("Ready", BadgeTone::Info),
            Self::OutForDelivery => ("Out for delivery", BadgeTone::Info),
            Self::Delivered => ("Delivered", BadgeTone::Success),
            Self::Cancelled => ("Cancelled", BadgeTone::Danger),
            Self::Unknown => ("Processing", BadgeTone::Neutral),
        };
        StatusBadge { label, tone }
    }

    /// Whether the order can no longer change.
    ///
    /// Status polling stops once an order reaches a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_known_and_aliases() {
        let status: OrderStatus = serde_json::from_str("\"out_for_delivery\"").unwrap();
        assert_eq!(status, OrderStatus::OutForDelivery);
        let status: OrderStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
        let status: OrderStatus = serde_json::from_str("\"ready_for_pickup\"").unwrap();
        assert_eq!(status, OrderStatus::Ready);
    }

    #[test]
    fn test_deserialize_unknown_status() {
        let status: OrderStatus = serde_json::from_str("\"awaiting_courier\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
        assert!(!status.is_terminal());
        assert_eq!(status.label(), "Processing");
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![OrderStatus::Delivered, OrderStatus::Cancelled]);
    }

    #[test]
    fn test_badges() {
        assert_eq!(OrderStatus::Pending.badge().css_class(), "badge badge-warning");
        assert_eq!(OrderStatus::Delivered.badge().css_class(), "badge badge-success");
        assert_eq!(OrderStatus::Cancelled.badge().css_class(), "badge badge-danger");
        assert_eq!(OrderStatus::OutForDelivery.label(), "Out for delivery");
    }

    #[test]
    fn test_from_str_roundtrips_wire_values() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<OrderStatus>().is_err());
    }
}
