//! Metadata key validation.
//!
//! A valid key:
//! - Must be non-empty
//! - May contain only ASCII letters, ASCII digits, `_`, `-`, and `.`
//!
//! No length limit is imposed. Keys are checked before every keyed
//! operation, so a malformed key never reaches the value store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeyError;

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

/// Validate a metadata key, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use mds_types::validate_key;
///
/// assert!(validate_key("service.config-v2_prod").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("has space").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }

    match key.chars().enumerate().find(|(_, ch)| !is_key_char(*ch)) {
        Some((position, ch)) => Err(KeyError::InvalidCharacter {
            key: key.to_string(),
            ch,
            position,
        }),
        None => Ok(()),
    }
}

/// A key that has passed [`validate_key`].
///
/// The only ways to build one go through validation, including
/// deserialization, so holding a `MetadataKey` is proof the key is well-formed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetadataKey(String);

impl MetadataKey {
    /// Validate `key` and wrap it.
    pub fn parse(key: impl Into<String>) -> Result<Self, KeyError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MetadataKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for MetadataKey {
    type Error = KeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl FromStr for MetadataKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<MetadataKey> for String {
    fn from(key: MetadataKey) -> Self {
        key.0
    }
}

impl AsRef<str> for MetadataKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
