//! In-memory view of the browser profile
//!
//! Each slice (keywords, bookmarks, base search URL) lives behind its own lock
//! and is swapped as a whole, so a reader holding a [`Snapshot`] sees either the
//! complete old slice or the complete new one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Base URL used when the profile does not record a search provider
pub const DEFAULT_GOOGLE_URL: &str = "https://www.google.com";

/// A search engine keyword as stored in the profile's keyword table
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub keyword: String,
    pub short_name: String,
    pub url_template: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Bookmark {
    pub url: String,
    pub name: String,
}

/// Keywords in insertion order, unique by `keyword`
#[derive(Debug, Default, Clone)]
pub struct KeywordTable {
    entries: Vec<Keyword>,
    index: HashMap<String, usize>,
}

impl KeywordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` unless its keyword is already present.
    /// Returns false when the entry was dropped as a duplicate.
    pub fn insert(&mut self, entry: Keyword) -> bool {
        if self.index.contains_key(&entry.keyword) {
            return false;
        }
        self.index.insert(entry.keyword.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    pub fn get(&self, keyword: &str) -> Option<&Keyword> {
        self.index.get(keyword).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyword> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Keyword> for KeywordTable {
    fn from_iter<I: IntoIterator<Item = Keyword>>(iter: I) -> Self {
        let mut table = KeywordTable::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

/// Consistent read view over all three slices
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub keywords: Arc<KeywordTable>,
    pub bookmarks: Arc<Vec<Bookmark>>,
    pub base_search_url: Arc<str>,
}

#[derive(Debug)]
pub struct DataStore {
    keywords: RwLock<Arc<KeywordTable>>,
    bookmarks: RwLock<Arc<Vec<Bookmark>>>,
    base_search_url: RwLock<Arc<str>>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self {
            keywords: RwLock::new(Arc::new(KeywordTable::new())),
            bookmarks: RwLock::new(Arc::new(Vec::new())),
            base_search_url: RwLock::new(Arc::from(DEFAULT_GOOGLE_URL)),
        }
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            keywords: self.keywords(),
            bookmarks: self.bookmarks(),
            base_search_url: self.base_search_url(),
        }
    }

    pub fn keywords(&self) -> Arc<KeywordTable> {
        self.keywords
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn bookmarks(&self) -> Arc<Vec<Bookmark>> {
        self.bookmarks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn base_search_url(&self) -> Arc<str> {
        self.base_search_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace_keywords(&self, table: KeywordTable) {
        let table = Arc::new(table);
        *self.keywords.write().unwrap_or_else(PoisonError::into_inner) = table;
    }

    pub fn replace_bookmarks(&self, bookmarks: Vec<Bookmark>) {
        let bookmarks = Arc::new(bookmarks);
        *self.bookmarks.write().unwrap_or_else(PoisonError::into_inner) = bookmarks;
    }

    /// An empty value falls back to [`DEFAULT_GOOGLE_URL`].
    pub fn replace_base_search_url(&self, url: &str) {
        let url: Arc<str> = if url.is_empty() {
            Arc::from(DEFAULT_GOOGLE_URL)
        } else {
            Arc::from(url)
        };
        *self
            .base_search_url
            .write()
            .unwrap_or_else(PoisonError::into_inner) = url;
    }
}
