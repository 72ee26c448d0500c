/// Errors from value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An insert hit an existing primary key.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A stored or supplied document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error reported by the SQLite backend.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The transaction body returned an error and was rolled back.
    #[error("transaction aborted")]
    Aborted,

    /// The backend is unusable (lock failure, misconfiguration).
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
