//! Account email addresses.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why an address was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,

    #[error("email must be at most {} characters", Email::MAX_LENGTH)]
    TooLong,

    #[error("email must be a local part and a domain joined by a single @")]
    Malformed,
}

/// A lower-cased account email.
///
/// Only the shape is checked: one `@` with something on both sides, at
/// most 254 characters. Deserializing goes through [`Email::parse`], so a
/// request body cannot smuggle in an unnormalised address.
///
/// ```
/// use tribal_market_core::Email;
///
/// let email = Email::parse(" Weaver@Example.com ").unwrap();
/// assert_eq!(email.as_str(), "weaver@example.com");
/// assert!(Email::parse("weaver@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Longest accepted address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Trim, validate and lower-case `input`.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] when the trimmed input is empty, too long, or
    /// not of the form `local@domain`.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong);
        }

        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(trimmed.to_lowercase()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the `@`, used as a fallback display name.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or(self.0.as_str(), |(local, _)| local)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_shapes() {
        for ok in ["a@b.c", "user.name+tag@mail.example.co.uk", "potter@example.com"] {
            assert!(Email::parse(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        for bad in ["no-at-symbol", "@example.com", "weaver@", "a@b@c.com"] {
            assert_eq!(Email::parse(bad), Err(EmailError::Malformed), "{bad}");
        }
    }

    #[test]
    fn test_length_limit() {
        let domain = "@example.com";
        let fits = format!("{}{domain}", "a".repeat(Email::MAX_LENGTH - domain.len()));
        assert!(Email::parse(&fits).is_ok());

        let over = format!("a{fits}");
        assert_eq!(Email::parse(&over), Err(EmailError::TooLong));
    }

    #[test]
    fn test_normalises_case_and_whitespace() {
        let email = Email::parse("  Weaver@Example.COM ").unwrap();
        assert_eq!(email.to_string(), "weaver@example.com");
        assert_eq!(email.local_part(), "weaver");
    }

    #[test]
    fn test_deserialize_validates_and_normalises() {
        let email: Email = serde_json::from_str("\"Potter@Example.com\"").unwrap();
        assert_eq!(email.as_str(), "potter@example.com");
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"potter@example.com\"");

        assert!(serde_json::from_str::<Email>("\"not-an-email\"").is_err());
    }
}
