//! Query matching against a [`Snapshot`]
//!
//! Keyword matches come first (prefix of the query followed by a space), then
//! bookmarks whose name contains the query. No further ranking is applied.

use crate::services::data_store::{Bookmark, Keyword, Snapshot};
use crate::services::url_resolver;
use serde::{Deserialize, Serialize};

/// Shortest accepted remainder after a keyword
const MIN_SEARCH_TERMS_CHARS: usize = 2;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "record_type", rename_all = "lowercase")]
pub enum Candidate {
    Keyword {
        keyword: String,
        short_name: String,
        search_terms: String,
        resolved_url: String,
        display_text: String,
    },
    Bookmark {
        url: String,
        name: String,
        display_text: String,
    },
}

impl Candidate {
    /// URL handed to the launcher when this candidate is run
    pub fn url(&self) -> &str {
        match self {
            Candidate::Keyword { resolved_url, .. } => resolved_url,
            Candidate::Bookmark { url, .. } => url,
        }
    }

    pub fn display_text(&self) -> &str {
        match self {
            Candidate::Keyword { display_text, .. } | Candidate::Bookmark { display_text, .. } => {
                display_text
            }
        }
    }
}

pub fn match_query(snapshot: &Snapshot, query: &str) -> Vec<Candidate> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();

    for keyword in snapshot.keywords.iter() {
        if let Some(search_terms) = search_terms_for(query, &keyword.keyword) {
            candidates.push(keyword_candidate(
                keyword,
                query,
                search_terms,
                &snapshot.base_search_url,
            ));
        }
    }

    let needle = query.to_lowercase();
    for bookmark in snapshot.bookmarks.iter() {
        if bookmark.name.to_lowercase().contains(&needle) {
            candidates.push(bookmark_candidate(bookmark));
        }
    }

    candidates
}

/// Remainder of `query` after `keyword` and one space, if long enough.
fn search_terms_for<'q>(query: &'q str, keyword: &str) -> Option<&'q str> {
    let search_terms = query.strip_prefix(keyword)?.strip_prefix(' ')?;
    (search_terms.chars().count() >= MIN_SEARCH_TERMS_CHARS).then_some(search_terms)
}

fn keyword_candidate(
    keyword: &Keyword,
    query: &str,
    search_terms: &str,
    base_search_url: &str,
) -> Candidate {
    let resolved_url =
        url_resolver::resolve_query(&keyword.url_template, query, search_terms, base_search_url);
    let display_text = format!(
        "Query \"{}\" for '{}'\n{}",
        keyword.short_name, search_terms, resolved_url
    );
    Candidate::Keyword {
        keyword: keyword.keyword.clone(),
        short_name: keyword.short_name.clone(),
        search_terms: search_terms.to_string(),
        resolved_url,
        display_text,
    }
}

fn bookmark_candidate(bookmark: &Bookmark) -> Candidate {
    Candidate::Bookmark {
        url: bookmark.url.clone(),
        name: bookmark.name.clone(),
        display_text: format!("\"{}\"\n{}", bookmark.name, bookmark.url),
    }
}
