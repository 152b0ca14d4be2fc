pub mod commands;
pub mod error;
pub mod services;
pub mod utils;

pub use commands::Config;
pub use error::{Result, RunnerError};
pub use services::data_store::{Bookmark, DataStore, Keyword, KeywordTable, Snapshot, DEFAULT_GOOGLE_URL};
pub use services::launcher::{BrowserLauncher, SystemLauncher};
pub use services::match_engine::Candidate;
pub use services::runner::{Runner, Source, SourcePaths};
pub use services::url_resolver::resolve;
