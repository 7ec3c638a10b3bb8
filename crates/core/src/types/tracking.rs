//! Public order tracking numbers.

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`TrackingNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingNumberError {
    #[error("tracking number cannot be empty")]
    Empty,
    #[error("tracking number must be at most {max} characters")]
    TooLong { max: usize },
    #[error("tracking number may only contain letters, digits, '-' and '_'")]
    InvalidCharacter,
}

/// An opaque order identifier used for public order-status lookup.
///
/// The backend decides the format; parsing only rejects input that could
/// never be a tracking number so the lookup form fails fast.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Maximum accepted length.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a tracking number from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, or contains
    /// characters other than ASCII letters, digits, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, TrackingNumberError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TrackingNumberError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(TrackingNumberError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TrackingNumberError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// The tracking number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        assert_eq!(TrackingNumber::parse("  BZR-20240101-0042 ").unwrap().as_str(), "BZR-20240101-0042");
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(TrackingNumber::parse(""), Err(TrackingNumberError::Empty));
        assert_eq!(
            TrackingNumber::parse("../etc/passwd"),
            Err(TrackingNumberError::InvalidCharacter)
        );
        assert!(matches!(
            TrackingNumber::parse(&"A".repeat(65)),
            Err(TrackingNumberError::TooLong { max: 64 })
        ));
    }
}
