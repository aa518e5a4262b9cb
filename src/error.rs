//! error types for the plumbing layer.
//!
//! One taxonomy for the whole crate, defined with `thiserror`. Protocol
//! and format errors are fatal to the in-flight request - the store is
//! local and deterministic, a retry cannot change the outcome. The
//! not-found family is recoverable and callers can branch on it via
//! [`StoreError::is_not_found`] instead of using errors for control flow.

use thiserror::Error;

/// the main error type for object store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// the batch channel answered with something we can't interpret
    #[error("protocol error: {0}")]
    Protocol(String),

    /// a payload or input violates the expected binary/text grammar
    #[error("format error: {0}")]
    Format(String),

    /// the store has no object under this id
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// the requested ref does not exist in its namespace
    #[error("ref not found: {0}")]
    RefNotFound(String),

    /// a path segment could not be resolved inside the tree
    #[error("'{path}' not found under {start}")]
    PathNotFound { start: String, path: String },

    /// the named entry is missing from the tree
    #[error("entry '{name}' not found in tree {tree}")]
    EntryNotFound { tree: String, name: String },

    /// commit ancestry is inconsistent (e.g. a cycle) while entries
    /// remain unattributed
    #[error("inconsistent ancestry starting at {start}: unresolved entries {unresolved:?}")]
    Integrity {
        start: String,
        unresolved: Vec<String>,
    },

    /// the cat-file child process could not be started or has terminated
    #[error("cat-file process unavailable: {0}")]
    Process(String),

    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::ObjectNotFound(_)
                | StoreError::RefNotFound(_)
                | StoreError::PathNotFound { .. }
                | StoreError::EntryNotFound { .. }
        )
    }
}

/// result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let missing = StoreError::RefNotFound("heads/main".to_string());
        assert!(missing.is_not_found());

        let entry = StoreError::EntryNotFound {
            tree: "abc".to_string(),
            name: "readme".to_string(),
        };
        assert!(entry.is_not_found());

        let protocol = StoreError::Protocol("bad header".to_string());
        assert!(!protocol.is_not_found());
    }
}
