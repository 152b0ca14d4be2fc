//! Runner lifecycle: initial load, reload dispatch, matching and launching

use crate::error::{Result, RunnerError};
use crate::services::data_store::{DataStore, Snapshot};
use crate::services::file_watcher::{ChangeWatcher, FileEventType};
use crate::services::launcher::BrowserLauncher;
use crate::services::match_engine::{self, Candidate};
use crate::services::source_reader;
use crate::utils::path_utils::{chromium_config_dir, normalize_path};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Locations of the three profile files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub web_data: PathBuf,
    pub local_state: PathBuf,
    pub bookmarks: PathBuf,
}

impl SourcePaths {
    pub fn from_home(home: &Path) -> Self {
        Self::for_profile(home, "Default")
    }

    pub fn for_profile(home: &Path, profile: &str) -> Self {
        let chromium = chromium_config_dir(home);
        Self {
            web_data: chromium.join(profile).join("Web Data"),
            local_state: chromium.join("Local State"),
            bookmarks: chromium.join(profile).join("Bookmarks"),
        }
    }

    pub fn all(&self) -> [PathBuf; 3] {
        [
            self.web_data.clone(),
            self.local_state.clone(),
            self.bookmarks.clone(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Keywords,
    BaseSearchUrl,
    Bookmarks,
}

/// Usage hint advertised to the host
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Syntax {
    pub example: &'static str,
    pub description: &'static str,
}

pub const SYNTAXES: [Syntax; 2] = [
    Syntax {
        example: "<Chromium keyword> :q:",
        description: "Search for :q: using Chromium keyword",
    },
    Syntax {
        example: ":q:",
        description: "Search for :q: in your Chromium bookmarks",
    },
];

/// Maps changed paths to loaders and publishes their results
#[derive(Debug, Clone)]
pub struct Dispatcher {
    paths: SourcePaths,
    normalized: SourcePaths,
    store: Arc<DataStore>,
}

impl Dispatcher {
    pub fn new(paths: SourcePaths, store: Arc<DataStore>) -> Self {
        let normalized = SourcePaths {
            web_data: normalize_path(&paths.web_data),
            local_state: normalize_path(&paths.local_state),
            bookmarks: normalize_path(&paths.bookmarks),
        };
        Self {
            paths,
            normalized,
            store,
        }
    }

    pub fn source_for(&self, path: &Path) -> Option<Source> {
        let candidates = [
            (&self.paths.web_data, &self.normalized.web_data, Source::Keywords),
            (&self.paths.local_state, &self.normalized.local_state, Source::BaseSearchUrl),
            (&self.paths.bookmarks, &self.normalized.bookmarks, Source::Bookmarks),
        ];
        if let Some((_, _, source)) = candidates.iter().find(|(raw, _, _)| raw.as_path() == path) {
            return Some(*source);
        }
        let path = normalize_path(path);
        candidates
            .iter()
            .find(|(_, normalized, _)| **normalized == path)
            .map(|(_, _, source)| *source)
    }

    /// Reloads the source registered for `path`, if any.
    ///
    /// Failures are logged and leave the previous slice in place.
    pub fn on_file_event(&self, path: &Path) -> Option<Source> {
        let Some(source) = self.source_for(path) else {
            debug!("Ignoring event for unregistered path {:?}", path);
            return None;
        };
        if let Err(e) = self.reload(source) {
            warn!("Failed to reload {:?}: {}", source, e);
        }
        Some(source)
    }

    pub fn reload(&self, source: Source) -> Result<()> {
        match source {
            Source::Keywords => {
                if let Some(table) = source_reader::load_keywords(&self.paths.web_data)? {
                    debug!("Loaded {} keywords", table.len());
                    self.store.replace_keywords(table);
                }
            }
            Source::BaseSearchUrl => {
                let url = source_reader::load_base_search_url(&self.paths.local_state)?;
                debug!("Base search URL is {}", url);
                self.store.replace_base_search_url(&url);
            }
            Source::Bookmarks => {
                let bookmarks = source_reader::load_bookmarks(&self.paths.bookmarks)?;
                debug!("Loaded {} bookmarks", bookmarks.len());
                self.store.replace_bookmarks(bookmarks);
            }
        }
        Ok(())
    }

    /// Loads every source once, logging failures.
    pub fn load_all(&self) {
        for source in [Source::Keywords, Source::Bookmarks, Source::BaseSearchUrl] {
            if let Err(e) = self.reload(source) {
                match e {
                    RunnerError::SourceUnavailable { .. } => debug!("{}", e),
                    _ => warn!("Failed to load {:?}: {}", source, e),
                }
            }
        }
    }
}

pub struct Runner {
    dispatcher: Dispatcher,
    store: Arc<DataStore>,
    launcher: Box<dyn BrowserLauncher>,
    watcher: Option<ChangeWatcher>,
}

impl Runner {
    /// Creates a runner with an empty store; nothing is read or watched.
    pub fn new(paths: SourcePaths, launcher: Box<dyn BrowserLauncher>) -> Self {
        let store = Arc::new(DataStore::new());
        Self {
            dispatcher: Dispatcher::new(paths, store.clone()),
            store,
            launcher,
            watcher: None,
        }
    }

    /// Loads all sources and, when `debounce` is given, watches them for changes.
    pub fn start(
        paths: SourcePaths,
        debounce: Option<Duration>,
        launcher: Box<dyn BrowserLauncher>,
    ) -> Result<Self> {
        let mut runner = Self::new(paths, launcher);
        runner.dispatcher.load_all();

        if let Some(debounce) = debounce {
            let dispatcher = runner.dispatcher.clone();
            let watcher = ChangeWatcher::start(
                &runner.dispatcher.paths.all(),
                debounce,
                move |path: &Path, _event: FileEventType| {
                    dispatcher.on_file_event(path);
                },
            )?;
            runner.watcher = Some(watcher);
        }

        let snapshot = runner.store.snapshot();
        info!(
            "Runner started with {} keywords and {} bookmarks",
            snapshot.keywords.len(),
            snapshot.bookmarks.len()
        );
        Ok(runner)
    }

    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn paths(&self) -> &SourcePaths {
        &self.dispatcher.paths
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn on_file_event(&self, path: &Path) -> Option<Source> {
        self.dispatcher.on_file_event(path)
    }

    pub fn reload(&self, source: Source) -> Result<()> {
        self.dispatcher.reload(source)
    }

    pub fn load_all(&self) {
        self.dispatcher.load_all();
    }

    pub fn match_query(&self, query: &str) -> Vec<Candidate> {
        match_engine::match_query(&self.store.snapshot(), query)
    }

    pub fn run(&self, candidate: &Candidate) -> Result<()> {
        self.launcher.invoke(candidate.url())
    }

    pub fn syntaxes(&self) -> &'static [Syntax] {
        &SYNTAXES
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.stop();
    }
}
