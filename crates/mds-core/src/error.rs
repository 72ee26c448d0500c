use mds_store::StoreError;
use mds_types::KeyError;
use thiserror::Error;

/// Why a request body was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BodyError {
    /// Not valid JSON, or a field has the wrong type. Carries a hint about
    /// the expected shape.
    #[error("{0}")]
    Malformed(&'static str),

    /// A required field is absent or empty.
    #[error("{0} cannot be empty")]
    MissingField(&'static str),

    /// A partial update with no fields.
    #[error("No fields provided for update")]
    EmptyUpdate,
}

/// Domain errors surfaced by the repository and service.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The key failed validation. Detected before any storage access.
    #[error(transparent)]
    InvalidKey(#[from] KeyError),

    /// A required field is missing or malformed.
    #[error("invalid body: {0}")]
    InvalidBody(#[from] BodyError),

    /// Create on a key that already exists.
    #[error("key already exists: {0}")]
    DuplicateKey(String),

    /// Operation on a key that does not exist.
    #[error("entry not found: {0}")]
    NotFound(String),

    /// Any other storage or serialization failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl MetadataError {
    /// Stable short code for logs and client error handling.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidKey(_) => "invalid_key",
            Self::InvalidBody(_) => "invalid_body",
            Self::DuplicateKey(_) => "duplicate_key",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage_failure",
        }
    }
}

impl From<StoreError> for MetadataError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(key) => Self::DuplicateKey(key),
            other => Self::Storage(other.to_string()),
        }
    }
}

pub type MetadataResult<T> = Result<T, MetadataError>;
