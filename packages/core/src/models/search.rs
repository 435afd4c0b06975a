//! Search, Ranking and Mutation Models
//!
//! Parameter and result shapes for the library collaborator's search,
//! semantic search and write operations.

use crate::models::ItemSummary;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default page size for library searches
pub const DEFAULT_SEARCH_LIMIT: usize = 25;

/// Upper bound on page size
pub const MAX_SEARCH_LIMIT: usize = 200;

/// Field used to order search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    DateAdded,
    DateModified,
    Title,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Parameters for a keyword library search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Case-insensitive text matched against title, creators and abstract
    #[serde(default)]
    pub q: Option<String>,

    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default)]
    pub item_type: Option<String>,

    #[serde(default)]
    pub collection_key: Option<String>,

    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub offset: Option<usize>,

    #[serde(default)]
    pub sort: Option<SortField>,

    #[serde(default)]
    pub direction: Option<SortDirection>,
}

impl SearchParams {
    /// Effective page size, clamped to `1..=MAX_SEARCH_LIMIT`
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }

    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<ItemSummary>,
    pub pagination: Pagination,
}

/// Options for semantic (meaning-based) search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticOptions {
    #[serde(default = "default_semantic_limit")]
    pub limit: usize,

    /// Hits scoring below this similarity are dropped
    #[serde(default)]
    pub min_score: f32,
}

fn default_semantic_limit() -> usize {
    10
}

impl Default for SemanticOptions {
    fn default() -> Self {
        Self {
            limit: default_semantic_limit(),
            min_score: 0.0,
        }
    }
}

/// One ranked semantic search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub item: ItemSummary,
    pub score: f32,
}

/// Write operations accepted by the library collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum MutationAction {
    #[serde(rename_all = "camelCase")]
    CreateNote { parent_key: String, content: String },
    #[serde(rename_all = "camelCase")]
    AddTags { item_key: String, tags: Vec<String> },
    #[serde(rename_all = "camelCase")]
    RemoveTags { item_key: String, tags: Vec<String> },
}

impl MutationAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateNote { .. } => "createNote",
            Self::AddTags { .. } => "addTags",
            Self::RemoveTags { .. } => "removeTags",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    pub success: bool,
    pub action: String,
    /// Key of the item or note that was written
    pub key: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}
