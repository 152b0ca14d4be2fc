pub mod data_store;
pub mod file_watcher;
pub mod launcher;
pub mod match_engine;
pub mod runner;
pub mod source_reader;
pub mod url_resolver;
