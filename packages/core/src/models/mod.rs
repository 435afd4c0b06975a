//! Data Models
//!
//! Structures exchanged with the reference library collaborator:
//!
//! - `Item`, `Collection`, `Creator`, `Note` - library records
//! - `SearchParams` / `SearchResults` - keyword search with pagination
//! - `SemanticOptions` / `RankedItem` - semantic search
//! - `MutationAction` / `MutationResult` - library writes

mod item;
mod search;

pub use item::{Collection, Creator, Item, ItemSummary, Note};
pub use search::{
    MutationAction, MutationResult, Pagination, RankedItem, SearchParams, SearchResults,
    SemanticOptions, SortDirection, SortField, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT,
};
