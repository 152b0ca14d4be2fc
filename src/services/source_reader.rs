//! Loaders for the three profile files the runner reads
//!
//! Every loader builds a complete slice and returns it; publishing it into the
//! [`DataStore`](super::data_store::DataStore) is left to the caller.

use crate::error::{Result, RunnerError};
use crate::services::data_store::{Bookmark, Keyword, KeywordTable, DEFAULT_GOOGLE_URL};
use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const KEYWORD_QUERY: &str = "SELECT short_name, keyword, url FROM keywords";

/// Reads the keyword table from a private copy of the `Web Data` database.
///
/// The browser keeps the database locked while running, so the file is copied
/// first. The copy is removed on every path out of this function. Returns
/// `Ok(None)` when the source is missing, unreadable or cannot be copied; the
/// caller keeps whatever keywords it already has.
pub fn load_keywords(path: &Path) -> Result<Option<KeywordTable>> {
    load_keywords_via(path, &std::env::temp_dir())
}

fn load_keywords_via(path: &Path, temp_dir: &Path) -> Result<Option<KeywordTable>> {
    if !is_readable_file(path) {
        debug!("Keyword source {:?} not available", path);
        return Ok(None);
    }

    let copy = match copy_to_temp(path, temp_dir) {
        Ok(copy) => copy,
        Err(e) => {
            warn!("Failed to copy keyword source {:?}: {}", path, e);
            return Ok(None);
        }
    };

    let result = read_keyword_table(copy.path()).map_err(|source| RunnerError::Database {
        path: path.to_path_buf(),
        source,
    });

    let copy_path = copy.path().to_path_buf();
    if let Err(e) = copy.close() {
        warn!("Failed to remove temporary copy {:?}: {}", copy_path, e);
    }

    result.map(Some)
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

fn copy_to_temp(path: &Path, temp_dir: &Path) -> io::Result<NamedTempFile> {
    let mut copy = tempfile::Builder::new()
        .prefix("chromium-runner-")
        .suffix(".db")
        .tempfile_in(temp_dir)?;
    let mut source = File::open(path)?;
    io::copy(&mut source, copy.as_file_mut())?;
    copy.as_file_mut().flush()?;
    Ok(copy)
}

fn read_keyword_table(db_path: &Path) -> rusqlite::Result<KeywordTable> {
    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare(KEYWORD_QUERY)?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;

    let mut table = KeywordTable::new();
    for row in rows {
        let (short_name, keyword, url) = row?;
        let (Some(keyword), Some(url_template)) = (keyword, url) else {
            continue;
        };
        // first row for a keyword wins
        table.insert(Keyword {
            keyword,
            short_name: short_name.unwrap_or_default(),
            url_template,
        });
    }

    Ok(table)
}

#[derive(Deserialize)]
struct BookmarkFile {
    #[serde(default)]
    roots: Map<String, Value>,
}

/// Reads the bookmark tree and flattens it depth-first.
///
/// Root collections are visited in document order, folders are entered where
/// they appear, and repeated `(url, name)` pairs are kept only once.
pub fn load_bookmarks(path: &Path) -> Result<Vec<Bookmark>> {
    let content = read_source(path)?;
    let file: BookmarkFile =
        serde_json::from_str(&content).map_err(|source| RunnerError::Format {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for root in file.roots.values().filter_map(Value::as_object) {
        if let Some(children) = root.get("children").and_then(Value::as_array) {
            walk_bookmark_nodes(children, &mut seen, &mut results);
        }
    }

    Ok(results)
}

fn walk_bookmark_nodes(
    nodes: &[Value],
    seen: &mut HashSet<Bookmark>,
    results: &mut Vec<Bookmark>,
) {
    for node in nodes {
        match node.get("type").and_then(Value::as_str) {
            Some("url") => {
                let url = node.get("url").and_then(Value::as_str);
                let name = node.get("name").and_then(Value::as_str);
                let (Some(url), Some(name)) = (url, name) else {
                    debug!("Skipping bookmark node without url or name");
                    continue;
                };
                let bookmark = Bookmark {
                    url: url.to_string(),
                    name: name.to_string(),
                };
                if seen.insert(bookmark.clone()) {
                    results.push(bookmark);
                }
            }
            Some("folder") => {
                if let Some(children) = node.get("children").and_then(Value::as_array) {
                    walk_bookmark_nodes(children, seen, results);
                }
            }
            _ => {}
        }
    }
}

/// Reads `browser.last_known_google_url` from `Local State`.
///
/// A missing or empty value yields [`DEFAULT_GOOGLE_URL`], never the previously
/// loaded value.
pub fn load_base_search_url(path: &Path) -> Result<String> {
    let content = read_source(path)?;
    let json: Value = serde_json::from_str(&content).map_err(|source| RunnerError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    let url = json
        .get("browser")
        .and_then(|browser| browser.get("last_known_google_url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_GOOGLE_URL);

    Ok(url.to_string())
}

fn read_source(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied) => {
            Err(RunnerError::SourceUnavailable {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(e.into()),
    }
}
