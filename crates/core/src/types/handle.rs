//! URL handle type for collections and products.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Handle`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The input string is empty.
    #[error("handle cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("handle must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character that is not allowed in a URL slug.
    #[error("handle contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A URL-safe slug identifying a collection or product.
///
/// ## Constraints
///
/// - Length: 1-255 bytes
/// - Characters: ASCII letters, digits, `-` and `_`
///
/// The constraints guarantee a handle can be placed into a URL path segment
/// without escaping.
///
/// ## Examples
///
/// ```
/// use collection_feed_core::Handle;
///
/// assert!(Handle::parse("womens-swim").is_ok());
/// assert!(Handle::parse("").is_err());
/// assert!(Handle::parse("../admin").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Maximum length of a handle.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `Handle` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 255 bytes, or
    /// contains anything other than ASCII alphanumerics, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, HandleError> {
        if s.is_empty() {
            return Err(HandleError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(HandleError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(HandleError::InvalidCharacter(c));
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Handle` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Handle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Handle {
    type Error = HandleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_handles() {
        assert!(Handle::parse("swim").is_ok());
        assert!(Handle::parse("womens-swim_2024").is_ok());
        assert!(Handle::parse("ALL").is_ok());
    }

    #[test]
    fn test_empty_handle() {
        assert_eq!(Handle::parse(""), Err(HandleError::Empty));
    }

    #[test]
    fn test_too_long_handle() {
        let long = "a".repeat(Handle::MAX_LENGTH + 1);
        assert_eq!(
            Handle::parse(&long),
            Err(HandleError::TooLong {
                max: Handle::MAX_LENGTH
            })
        );
        assert!(Handle::parse(&"a".repeat(Handle::MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_rejects_path_characters() {
        assert_eq!(
            Handle::parse("swim/../admin"),
            Err(HandleError::InvalidCharacter('/'))
        );
        assert_eq!(
            Handle::parse("swim?page=2"),
            Err(HandleError::InvalidCharacter('?'))
        );
        assert_eq!(
            Handle::parse("maillot de bain"),
            Err(HandleError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn test_serde_validates() {
        let handle: Handle = serde_json::from_str("\"swim\"").unwrap();
        assert_eq!(handle.as_str(), "swim");
        assert!(serde_json::from_str::<Handle>("\"bad handle\"").is_err());
        assert_eq!(serde_json::to_string(&handle).unwrap(), "\"swim\"");
    }
}
