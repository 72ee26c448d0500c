use thiserror::Error;

/// Why a metadata key was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The key is the empty string.
    #[error("invalid key format: key must not be empty")]
    Empty,

    /// The key contains a character outside `[A-Za-z0-9_.-]`.
    #[error(
        "invalid key format: {key:?} contains {ch:?} at position {position}; \
         key can only contain alphanumeric characters, underscore, hyphen, and dot"
    )]
    InvalidCharacter {
        key: String,
        ch: char,
        position: usize,
    },
}
