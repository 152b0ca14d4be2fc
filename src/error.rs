use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Source not available: {}", path.display())]
    SourceUnavailable { path: PathBuf },

    #[error("Malformed document '{}': {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read keyword table '{}': {source}", path.display())]
    Database {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Failed to open '{url}': {source}")]
    Launch {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("No result {index} (only {count} results)")]
    NoSuchResult { index: usize, count: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
