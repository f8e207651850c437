//! Error types for tablebill storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The appended period does not follow the subscriber's latest revision.
    ///
    /// Another writer superseded the period first; re-read and retry.
    #[error("revision conflict: expected revision {expected}, got {actual}")]
    RevisionConflict {
        /// The revision the store would accept next.
        expected: u32,
        /// The revision that was offered.
        actual: u32,
    },
}
