//! Error types for the Ordbok domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Ordbok operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Record store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a table file failed for a reason other than absence.
    /// Fatal at startup; during a mutation the in-memory table is rolled back
    /// before this propagates.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A table file exists but its contents could not be decoded.
    #[error("Table corrupted: {0}")]
    Corrupt(String),

    /// An index-addressed operation referenced a row outside the table's
    /// current length. The whole batch is rejected; nothing was mutated.
    #[error("Index out of range, table has {len} rows")]
    IndexOutOfRange { len: usize },
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_error_displays_valid_range() {
        let err = Error::Store(StoreError::IndexOutOfRange { len: 3 });
        assert!(err.to_string().contains("3 rows"));
    }

    #[test]
    fn storage_error_wraps_message() {
        let err = Error::Store(StoreError::Storage("disk full".into()));
        assert!(err.to_string().contains("disk full"));
    }
}
