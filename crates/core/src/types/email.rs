//! Registration email address.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why an address was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    /// Not shaped like `name@domain`, or contains whitespace.
    #[error("email must look like name@domain")]
    Malformed,
}

/// An email address, trimmed and lowercased.
///
/// Lowercasing means two registrations that differ only in case collide on
/// the unique index. Beyond the `name@domain` shape nothing is checked; the
/// address is never mailed.
///
/// ```
/// use coding_gurus_core::Email;
///
/// let email = Email::parse("  Ada@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "ada@example.com");
/// assert!(Email::parse("ada at example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Trim, check and lowercase an address.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] when the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or not shaped like `name@domain`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let candidate = s.trim();
        match candidate.len() {
            0 => return Err(EmailError::Empty),
            n if n > Self::MAX_LENGTH => {
                return Err(EmailError::TooLong {
                    max: Self::MAX_LENGTH,
                });
            }
            _ => {}
        }

        let well_formed = !candidate.contains(char::is_whitespace)
            && candidate
                .rsplit_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());

        if well_formed {
            Ok(Self(candidate.to_lowercase()))
        } else {
            Err(EmailError::Malformed)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_shapes() {
        for ok in ["user@example.com", "user.name+tag@example.co.uk", "a@b.c"] {
            assert!(Email::parse(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_lowercases_and_trims() {
        assert_eq!(
            Email::parse("  Guru@Example.COM\n").map(|e| e.to_string()),
            Ok("guru@example.com".to_owned())
        );
    }

    #[test]
    fn test_length_limits() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));

        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            Email::parse(&long),
            Err(EmailError::TooLong {
                max: Email::MAX_LENGTH
            })
        );
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["no-at-symbol", "@domain.com", "user@", "two words@example.com"] {
            assert_eq!(Email::parse(bad), Err(EmailError::Malformed), "{bad}");
        }
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email = Email::parse("user@example.com").map_err(|e| e.to_string());
        let json = email.and_then(|e| serde_json::to_string(&e).map_err(|e| e.to_string()));
        assert_eq!(json.as_deref(), Ok("\"user@example.com\""));
    }
}
