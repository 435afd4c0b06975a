//! Reference Library Collaborator
//!
//! The MCP engine never touches library storage directly. Every tool call is
//! adapted onto one method of [`ReferenceLibrary`], an opaque async interface
//! that either returns data or fails with a [`LibraryError`] carrying a
//! human-readable message.
//!
//! [`InMemoryLibrary`] is a complete implementation backed by a JSON snapshot,
//! used by the `shelfmark` binary and by the test suites.

mod error;
mod memory;

pub use error::{LibraryError, LibraryResult};
pub use memory::{InMemoryLibrary, LibrarySnapshot};

use crate::models::{
    Collection, Item, ItemSummary, MutationAction, MutationResult, RankedItem, SearchParams,
    SearchResults, SemanticOptions,
};
use async_trait::async_trait;

/// Data access interface consumed by the tool router
///
/// Implementations must be cheap to share (`Arc<dyn ReferenceLibrary>`); the
/// router calls them from many connection tasks.
#[async_trait]
pub trait ReferenceLibrary: Send + Sync {
    /// Look up a single item by key
    async fn lookup_item(&self, key: &str) -> LibraryResult<Item>;

    /// Keyword search with filters and pagination
    async fn search_library(&self, params: SearchParams) -> LibraryResult<SearchResults>;

    /// Extract the full text of an item's attachments
    async fn extract_fulltext(&self, item_key: &str) -> LibraryResult<String>;

    /// Rank items by meaning rather than exact terms
    async fn semantic_search(
        &self,
        query: &str,
        options: SemanticOptions,
    ) -> LibraryResult<Vec<RankedItem>>;

    /// Apply a write to the library
    async fn mutate_library(&self, action: MutationAction) -> LibraryResult<MutationResult>;

    /// All collections, ordered by name
    async fn list_collections(&self) -> LibraryResult<Vec<Collection>>;

    /// Items filed directly in a collection
    async fn collection_items(&self, collection_key: &str) -> LibraryResult<Vec<ItemSummary>>;
}
