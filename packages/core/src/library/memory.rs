//! In-memory Reference Library
//!
//! A `ReferenceLibrary` held entirely in memory behind a `tokio::sync::RwLock`.
//! Loaded from a JSON snapshot (`{"items": [...], "collections": [...]}`).
//!
//! Semantic search here is a term-overlap cosine score over title, abstract,
//! tags and full text. It is good enough to exercise the protocol end to end;
//! real deployments plug an embedding-backed collaborator in instead.

use crate::library::{LibraryError, LibraryResult, ReferenceLibrary};
use crate::models::{
    Collection, Item, ItemSummary, MutationAction, MutationResult, Note, Pagination, RankedItem,
    SearchParams, SearchResults, SemanticOptions, SortDirection, SortField,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::RwLock;

/// Serialized form of a whole library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub items: Vec<Item>,

    #[serde(default)]
    pub collections: Vec<Collection>,
}

#[derive(Debug, Default)]
struct LibraryState {
    items: BTreeMap<String, Item>,
    collections: BTreeMap<String, Collection>,
}

/// Reference library held in process memory
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    state: RwLock<LibraryState>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LibrarySnapshot) -> Self {
        let state = LibraryState {
            items: snapshot
                .items
                .into_iter()
                .map(|item| (item.key.clone(), item))
                .collect(),
            collections: snapshot
                .collections
                .into_iter()
                .map(|c| (c.key.clone(), c))
                .collect(),
        };
        Self {
            state: RwLock::new(state),
        }
    }

    /// Parse a JSON snapshot
    pub fn from_json_str(json: &str) -> LibraryResult<Self> {
        let snapshot: LibrarySnapshot = serde_json::from_str(json)
            .map_err(|e| LibraryError::backend(format!("Invalid library snapshot: {}", e)))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Load a JSON snapshot from disk
    pub async fn load(path: &Path) -> LibraryResult<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            LibraryError::backend(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub async fn insert_item(&self, item: Item) {
        self.state.write().await.items.insert(item.key.clone(), item);
    }

    pub async fn insert_collection(&self, collection: Collection) {
        self.state
            .write()
            .await
            .collections
            .insert(collection.key.clone(), collection);
    }

    pub async fn item_count(&self) -> usize {
        self.state.read().await.items.len()
    }
}

#[async_trait]
impl ReferenceLibrary for InMemoryLibrary {
    async fn lookup_item(&self, key: &str) -> LibraryResult<Item> {
        self.state
            .read()
            .await
            .items
            .get(key)
            .cloned()
            .ok_or_else(|| LibraryError::item_not_found(key))
    }

    async fn search_library(&self, params: SearchParams) -> LibraryResult<SearchResults> {
        let state = self.state.read().await;

        if let Some(collection_key) = &params.collection_key {
            if !state.collections.contains_key(collection_key) {
                return Err(LibraryError::collection_not_found(collection_key));
            }
        }

        let needle = params
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<&Item> = state
            .items
            .values()
            .filter(|item| {
                if let Some(needle) = &needle {
                    if !matches_text(item, needle) {
                        return false;
                    }
                }
                if let Some(tag) = &params.tag {
                    if !item.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                        return false;
                    }
                }
                if let Some(item_type) = &params.item_type {
                    if &item.item_type != item_type {
                        return false;
                    }
                }
                if let Some(collection_key) = &params.collection_key {
                    if !item.collections.contains(collection_key) {
                        return false;
                    }
                }
                true
            })
            .collect();

        sort_items(
            &mut matches,
            params.sort.unwrap_or_default(),
            params.direction.unwrap_or_default(),
        );

        let total = matches.len();
        let offset = params.effective_offset();
        let limit = params.effective_limit();
        let results: Vec<ItemSummary> = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(Item::summary)
            .collect();

        Ok(SearchResults {
            pagination: Pagination {
                total,
                offset,
                limit,
                has_more: offset + results.len() < total,
            },
            results,
        })
    }

    async fn extract_fulltext(&self, item_key: &str) -> LibraryResult<String> {
        let state = self.state.read().await;
        let item = state
            .items
            .get(item_key)
            .ok_or_else(|| LibraryError::item_not_found(item_key))?;

        item.fulltext
            .clone()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| LibraryError::fulltext_unavailable(item_key))
    }

    async fn semantic_search(
        &self,
        query: &str,
        options: SemanticOptions,
    ) -> LibraryResult<Vec<RankedItem>> {
        let query_terms = term_frequencies(query);
        if query_terms.is_empty() {
            return Err(LibraryError::invalid_argument(
                "query must contain at least one searchable term",
            ));
        }

        let state = self.state.read().await;
        let mut ranked: Vec<RankedItem> = state
            .items
            .values()
            .filter_map(|item| {
                let score = cosine(&query_terms, &term_frequencies(&semantic_text(item)));
                (score > 0.0 && score >= options.min_score).then(|| RankedItem {
                    item: item.summary(),
                    score,
                })
            })
            .collect();

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(options.limit);
        Ok(ranked)
    }

    async fn mutate_library(&self, action: MutationAction) -> LibraryResult<MutationResult> {
        let mut state = self.state.write().await;
        let action_name = action.name().to_string();

        match action {
            MutationAction::CreateNote {
                parent_key,
                content,
            } => {
                if content.trim().is_empty() {
                    return Err(LibraryError::invalid_argument("note content cannot be empty"));
                }
                let parent = state
                    .items
                    .get_mut(&parent_key)
                    .ok_or_else(|| LibraryError::item_not_found(&parent_key))?;

                let note_key = new_note_key();
                parent.notes.push(Note {
                    key: note_key.clone(),
                    content,
                    date_added: Utc::now(),
                });
                parent.date_modified = Utc::now();

                Ok(MutationResult {
                    success: true,
                    action: action_name,
                    key: note_key,
                    details: json!({ "parentKey": parent_key }),
                })
            }
            MutationAction::AddTags { item_key, tags } => {
                let item = state
                    .items
                    .get_mut(&item_key)
                    .ok_or_else(|| LibraryError::item_not_found(&item_key))?;

                let mut added = Vec::new();
                for tag in tags {
                    let tag = tag.trim().to_string();
                    if !tag.is_empty() && !item.tags.contains(&tag) {
                        item.tags.push(tag.clone());
                        added.push(tag);
                    }
                }
                if !added.is_empty() {
                    item.date_modified = Utc::now();
                }

                Ok(MutationResult {
                    success: true,
                    action: action_name,
                    key: item_key,
                    details: json!({ "added": added, "tags": item.tags }),
                })
            }
            MutationAction::RemoveTags { item_key, tags } => {
                let item = state
                    .items
                    .get_mut(&item_key)
                    .ok_or_else(|| LibraryError::item_not_found(&item_key))?;

                let before = item.tags.len();
                item.tags.retain(|t| !tags.contains(t));
                let removed = before - item.tags.len();
                if removed > 0 {
                    item.date_modified = Utc::now();
                }

                Ok(MutationResult {
                    success: true,
                    action: action_name,
                    key: item_key,
                    details: json!({ "removed": removed, "tags": item.tags }),
                })
            }
        }
    }

    async fn list_collections(&self) -> LibraryResult<Vec<Collection>> {
        let mut collections: Vec<Collection> =
            self.state.read().await.collections.values().cloned().collect();
        collections.sort_by_key(|c| c.name.to_lowercase());
        Ok(collections)
    }

    async fn collection_items(&self, collection_key: &str) -> LibraryResult<Vec<ItemSummary>> {
        let state = self.state.read().await;
        if !state.collections.contains_key(collection_key) {
            return Err(LibraryError::collection_not_found(collection_key));
        }

        Ok(state
            .items
            .values()
            .filter(|item| item.collections.iter().any(|c| c == collection_key))
            .map(Item::summary)
            .collect())
    }
}

fn matches_text(item: &Item, needle: &str) -> bool {
    item.title.to_lowercase().contains(needle)
        || item
            .creators
            .iter()
            .any(|c| c.display_name().to_lowercase().contains(needle))
        || item
            .abstract_note
            .as_deref()
            .is_some_and(|a| a.to_lowercase().contains(needle))
}

fn sort_items(items: &mut [&Item], field: SortField, direction: SortDirection) {
    items.sort_by(|a, b| {
        let ordering = match field {
            SortField::DateAdded => a.date_added.cmp(&b.date_added),
            SortField::DateModified => a.date_modified.cmp(&b.date_modified),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Date => a.date.cmp(&b.date),
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn semantic_text(item: &Item) -> String {
    let mut text = item.title.clone();
    for part in [item.abstract_note.as_deref(), item.fulltext.as_deref()]
        .into_iter()
        .flatten()
    {
        text.push(' ');
        text.push_str(part);
    }
    for tag in &item.tags {
        text.push(' ');
        text.push_str(tag);
    }
    text
}

fn term_frequencies(text: &str) -> HashMap<String, f32> {
    let mut terms = HashMap::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 1)
    {
        *terms.entry(word.to_lowercase()).or_insert(0.0) += 1.0;
    }
    terms
}

fn cosine(a: &HashMap<String, f32>, b: &HashMap<String, f32>) -> f32 {
    let dot: f32 = a
        .iter()
        .filter_map(|(term, weight)| b.get(term).map(|other| weight * other))
        .sum();
    if dot == 0.0 {
        return 0.0;
    }
    let norm = |v: &HashMap<String, f32>| v.values().map(|w| w * w).sum::<f32>().sqrt();
    dot / (norm(a) * norm(b))
}

fn new_note_key() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;
