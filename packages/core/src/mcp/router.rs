//! Tool Router
//!
//! Static table from tool name to one [`ReferenceLibrary`] call. Each entry
//! checks its required arguments, converts the JSON arguments into the
//! collaborator's native types, and serializes whatever comes back. No
//! business logic lives here.

use crate::library::{LibraryError, ReferenceLibrary};
use crate::models::{MutationAction, SearchParams, SemanticOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors produced while routing or executing a tool call
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("{0}")]
    Library(#[from] LibraryError),

    #[error("Failed to serialize tool result: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    fn invalid(name: &'static str, reason: impl fmt::Display) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.to_string(),
        }
    }
}

/// Every tool the router knows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    SearchLibrary,
    GetItemDetails,
    GetItemAbstract,
    GetItemFulltext,
    SemanticSearch,
    GetCollections,
    GetCollectionItems,
    CreateNote,
    AddTags,
    RemoveTags,
}

impl ToolName {
    pub const ALL: [ToolName; 10] = [
        ToolName::SearchLibrary,
        ToolName::GetItemDetails,
        ToolName::GetItemAbstract,
        ToolName::GetItemFulltext,
        ToolName::SemanticSearch,
        ToolName::GetCollections,
        ToolName::GetCollectionItems,
        ToolName::CreateNote,
        ToolName::AddTags,
        ToolName::RemoveTags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchLibrary => "search_library",
            Self::GetItemDetails => "get_item_details",
            Self::GetItemAbstract => "get_item_abstract",
            Self::GetItemFulltext => "get_item_fulltext",
            Self::SemanticSearch => "semantic_search",
            Self::GetCollections => "get_collections",
            Self::GetCollectionItems => "get_collection_items",
            Self::CreateNote => "create_note",
            Self::AddTags => "add_tags",
            Self::RemoveTags => "remove_tags",
        }
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapts tool calls onto the reference library
#[derive(Clone)]
pub struct ToolRouter {
    library: Arc<dyn ReferenceLibrary>,
}

impl ToolRouter {
    pub fn new(library: Arc<dyn ReferenceLibrary>) -> Self {
        Self { library }
    }

    pub fn tool_count(&self) -> usize {
        ToolName::ALL.len()
    }

    /// Resolve `name` and run the tool with `arguments`
    pub async fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let tool: ToolName = name.parse()?;
        self.call_tool(tool, arguments).await
    }

    pub async fn call_tool(&self, tool: ToolName, arguments: Value) -> Result<Value, ToolError> {
        let args = Arguments::new(arguments)?;
        debug!(tool = %tool, "Routing tool call");

        match tool {
            ToolName::SearchLibrary => {
                let params: SearchParams = args.parse_all("search")?;
                to_json(self.library.search_library(params).await?)
            }

            ToolName::GetItemDetails => {
                let key = args.required_str("itemKey")?;
                to_json(self.library.lookup_item(&key).await?)
            }

            ToolName::GetItemAbstract => {
                let key = args.required_str("itemKey")?;
                let item = self.library.lookup_item(&key).await?;
                Ok(json!({
                    "key": item.key,
                    "title": item.title,
                    "abstract": item.abstract_note,
                }))
            }

            ToolName::GetItemFulltext => {
                let key = args.required_str("itemKey")?;
                let max_chars: Option<usize> = args.optional("maxChars")?;
                let text = self.library.extract_fulltext(&key).await?;
                let length = text.chars().count();
                let (text, truncated) = match max_chars {
                    Some(max) if length > max => (text.chars().take(max).collect::<String>(), true),
                    _ => (text, false),
                };
                Ok(json!({
                    "key": key,
                    "length": length,
                    "truncated": truncated,
                    "text": text,
                }))
            }

            ToolName::SemanticSearch => {
                let query = args.required_str("query")?;
                let defaults = SemanticOptions::default();
                let options = SemanticOptions {
                    limit: args.optional("limit")?.unwrap_or(defaults.limit),
                    min_score: args.optional("minScore")?.unwrap_or(defaults.min_score),
                };
                let hits = self.library.semantic_search(&query, options).await?;
                Ok(json!({
                    "query": query,
                    "count": hits.len(),
                    "results": to_json(hits)?,
                }))
            }

            ToolName::GetCollections => {
                let collections = self.library.list_collections().await?;
                Ok(json!({
                    "count": collections.len(),
                    "collections": to_json(collections)?,
                }))
            }

            ToolName::GetCollectionItems => {
                let key = args.required_str("collectionKey")?;
                let items = self.library.collection_items(&key).await?;
                Ok(json!({
                    "collectionKey": key,
                    "count": items.len(),
                    "items": to_json(items)?,
                }))
            }

            ToolName::CreateNote => {
                let action = MutationAction::CreateNote {
                    parent_key: args.required_str("parentKey")?,
                    content: args.required_str("content")?,
                };
                to_json(self.library.mutate_library(action).await?)
            }

            ToolName::AddTags => {
                let action = MutationAction::AddTags {
                    item_key: args.required_str("itemKey")?,
                    tags: args.required_tags("tags")?,
                };
                to_json(self.library.mutate_library(action).await?)
            }

            ToolName::RemoveTags => {
                let action = MutationAction::RemoveTags {
                    item_key: args.required_str("itemKey")?,
                    tags: args.required_tags("tags")?,
                };
                to_json(self.library.mutate_library(action).await?)
            }
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(value)?)
}

/// Argument object of one tool call
struct Arguments(Map<String, Value>);

impl Arguments {
    fn new(arguments: Value) -> Result<Self, ToolError> {
        match arguments {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self(Map::new())),
            other => Err(ToolError::invalid(
                "arguments",
                format!("expected an object, got {}", json_type(&other)),
            )),
        }
    }

    fn present(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    fn required_str(&self, name: &'static str) -> Result<String, ToolError> {
        match self.present(name) {
            None => Err(ToolError::MissingArgument(name)),
            Some(Value::String(s)) if s.trim().is_empty() => Err(ToolError::MissingArgument(name)),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(ToolError::invalid(
                name,
                format!("expected a string, got {}", json_type(other)),
            )),
        }
    }

    fn optional<T: DeserializeOwned>(&self, name: &'static str) -> Result<Option<T>, ToolError> {
        self.present(name)
            .map(|value| serde_json::from_value(value.clone()).map_err(|e| ToolError::invalid(name, e)))
            .transpose()
    }

    /// Tags as an array of strings; a single string is accepted as one tag
    fn required_tags(&self, name: &'static str) -> Result<Vec<String>, ToolError> {
        let tags = match self.present(name) {
            None => return Err(ToolError::MissingArgument(name)),
            Some(Value::String(tag)) => vec![tag.clone()],
            Some(value) => serde_json::from_value::<Vec<String>>(value.clone())
                .map_err(|e| ToolError::invalid(name, e))?,
        };
        let tags: Vec<String> = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tags.is_empty() {
            return Err(ToolError::MissingArgument(name));
        }
        Ok(tags)
    }

    fn parse_all<T: DeserializeOwned>(&self, name: &'static str) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| ToolError::invalid(name, e))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;
