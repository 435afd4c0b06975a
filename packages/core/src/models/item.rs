//! Library Item and Collection Models
//!
//! Records exchanged with the reference library collaborator. Field names are
//! camelCase on the wire so tool results read the same way the tool arguments do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A creator (author, editor, ...) attached to an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    /// Role such as "author" or "editor"
    #[serde(default = "default_creator_type")]
    pub creator_type: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,
}

fn default_creator_type() -> String {
    "author".to_string()
}

impl Creator {
    pub fn author(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            creator_type: default_creator_type(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// "First Last", or whichever half is present
    pub fn display_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (true, false) => self.last_name.clone(),
            _ => self.first_name.clone(),
        }
    }
}

/// A child note attached to an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub key: String,
    pub content: String,
    pub date_added: DateTime<Utc>,
}

/// A reference library item (article, book, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Stable item key
    pub key: String,

    /// Item type such as "journalArticle" or "book"
    #[serde(default = "default_item_type")]
    pub item_type: String,

    pub title: String,

    #[serde(default)]
    pub creators: Vec<Creator>,

    /// Free-form publication date ("2021", "2021-03-04", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Keys of the collections that contain this item
    #[serde(default)]
    pub collections: Vec<String>,

    #[serde(default)]
    pub notes: Vec<Note>,

    /// Extracted attachment text; never serialized with the item itself
    #[serde(default, skip_serializing)]
    pub fulltext: Option<String>,

    #[serde(default = "Utc::now")]
    pub date_added: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub date_modified: DateTime<Utc>,
}

fn default_item_type() -> String {
    "journalArticle".to_string()
}

impl Item {
    /// Create an item with the given key and title and empty metadata
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            item_type: default_item_type(),
            title: title.into(),
            creators: Vec::new(),
            date: None,
            abstract_note: None,
            doi: None,
            url: None,
            tags: Vec::new(),
            collections: Vec::new(),
            notes: Vec::new(),
            fulltext: None,
            date_added: now,
            date_modified: now,
        }
    }

    pub fn with_creator(mut self, creator: Creator) -> Self {
        self.creators.push(creator);
        self
    }

    pub fn with_abstract(mut self, abstract_note: impl Into<String>) -> Self {
        self.abstract_note = Some(abstract_note.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_collection(mut self, collection_key: impl Into<String>) -> Self {
        self.collections.push(collection_key.into());
        self
    }

    pub fn with_fulltext(mut self, fulltext: impl Into<String>) -> Self {
        self.fulltext = Some(fulltext.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Leading four-digit year of `date`, if any
    pub fn year(&self) -> Option<i32> {
        let date = self.date.as_deref()?;
        date.get(..4)?.parse().ok()
    }

    /// Compact projection used in search and collection listings
    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            key: self.key.clone(),
            item_type: self.item_type.clone(),
            title: self.title.clone(),
            creators: self.creators.iter().map(Creator::display_name).collect(),
            date: self.date.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Compact view of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub key: String,
    pub item_type: String,
    pub title: String,
    pub creators: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub tags: Vec<String>,
}

/// A collection (folder) in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub key: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
}

impl Collection {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            parent_key: None,
        }
    }
}
