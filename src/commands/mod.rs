pub mod config;
pub mod search;

use crate::error::{Result, RunnerError};
use crate::services::file_watcher::DEBOUNCE_DELAY_MS;
use crate::services::runner::SourcePaths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Home directory the profile lives under, `$HOME` when unset
    pub home: Option<PathBuf>,
    pub profile: String,
    pub web_data: Option<PathBuf>,
    pub local_state: Option<PathBuf>,
    pub bookmarks: Option<PathBuf>,
    pub watch: bool,
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home: None,
            profile: "Default".to_string(),
            web_data: None,
            local_state: None,
            bookmarks: None,
            watch: true,
            debounce_ms: DEBOUNCE_DELAY_MS,
        }
    }
}

impl Config {
    /// Resolves the three source paths; explicit paths win over the home layout.
    pub fn source_paths(&self) -> Result<SourcePaths> {
        let home = self.home.clone().or_else(dirs::home_dir);
        let defaults = home.map(|home| SourcePaths::for_profile(&home, &self.profile));

        let pick = |explicit: &Option<PathBuf>, default: Option<&PathBuf>, name: &str| {
            explicit
                .clone()
                .or_else(|| default.cloned())
                .ok_or_else(|| {
                    RunnerError::Config(format!(
                        "Unable to locate {}: no home directory and no explicit path",
                        name
                    ))
                })
        };

        Ok(SourcePaths {
            web_data: pick(&self.web_data, defaults.as_ref().map(|d| &d.web_data), "Web Data")?,
            local_state: pick(
                &self.local_state,
                defaults.as_ref().map(|d| &d.local_state),
                "Local State",
            )?,
            bookmarks: pick(&self.bookmarks, defaults.as_ref().map(|d| &d.bookmarks), "Bookmarks")?,
        })
    }

    /// Debounce window for the watcher, `None` when watching is disabled
    pub fn debounce(&self) -> Option<Duration> {
        self.watch.then(|| Duration::from_millis(self.debounce_ms))
    }
}
