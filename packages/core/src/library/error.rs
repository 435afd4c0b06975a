//! Library Collaborator Error Types
//!
//! Errors raised by the reference library data layer. The MCP layer never
//! inspects these beyond their display text.

use thiserror::Error;

/// Reference library operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LibraryError {
    /// Item not found by key
    #[error("Item not found: {key}")]
    ItemNotFound { key: String },

    /// Collection not found by key
    #[error("Collection not found: {key}")]
    CollectionNotFound { key: String },

    /// The item exists but has no extractable text
    #[error("No fulltext available for item: {key}")]
    FulltextUnavailable { key: String },

    /// Argument rejected by the data layer
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Storage or index failure
    #[error("Library backend error: {0}")]
    Backend(String),
}

impl LibraryError {
    pub fn item_not_found(key: impl Into<String>) -> Self {
        Self::ItemNotFound { key: key.into() }
    }

    pub fn collection_not_found(key: impl Into<String>) -> Self {
        Self::CollectionNotFound { key: key.into() }
    }

    pub fn fulltext_unavailable(key: impl Into<String>) -> Self {
        Self::FulltextUnavailable { key: key.into() }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
