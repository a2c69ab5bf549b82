//! Errors reported by storage ports.

/// Why a layout store operation failed.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Nothing stored under the id.
    #[error("{record} not found: {id}")]
    NotFound { record: &'static str, id: String },

    /// The backing store itself failed (I/O, permissions, ...).
    #[error("{operation} failed: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },

    /// A stored document could not be encoded or decoded.
    #[error("Stored layout is not valid JSON: {0}")]
    Serialization(String),
}

impl RepoError {
    pub fn not_found(record: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            record,
            id: id.to_string(),
        }
    }

    pub fn storage(operation: &'static str, message: impl ToString) -> Self {
        Self::Storage {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
