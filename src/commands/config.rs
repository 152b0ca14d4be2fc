use crate::commands::Config;
use crate::error::{Result, RunnerError};
use once_cell::sync::Lazy;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(load_config()));

fn load_config() -> Config {
    match get_config_path() {
        Ok(path) => load_config_from(&path),
        Err(e) => {
            debug!("{}", e);
            Config::default()
        }
    }
}

/// Reads a config file, falling back to defaults when it is missing or invalid.
pub fn load_config_from(path: &Path) -> Config {
    let Ok(json) = fs::read_to_string(path) else {
        return Config::default();
    };
    match serde_json::from_str::<Config>(&json) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring invalid config {:?}: {}", path, e);
            Config::default()
        }
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| RunnerError::Config("Unable to get config directory".to_string()))?
        .join("chromium-runner");
    Ok(config_dir.join("config.json"))
}

pub fn get_config() -> Result<Config> {
    let config = CONFIG
        .lock()
        .map_err(|e| RunnerError::Config(e.to_string()))?;
    Ok(config.clone())
}

pub fn set_config(new_config: Config) -> Result<()> {
    let mut config = CONFIG
        .lock()
        .map_err(|e| RunnerError::Config(e.to_string()))?;
    save_config_to(&get_config_path()?, &new_config)?;
    *config = new_config;
    Ok(())
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| RunnerError::Config(e.to_string()))?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_config_from(&dir.path().join("config.json")), Config::default());
    }

    #[test]
    fn test_invalid_config_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();
        assert_eq!(load_config_from(&path), Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            profile: "Profile 2".to_string(),
            debounce_ms: 50,
            ..Config::default()
        };
        save_config_to(&path, &config).unwrap();
        assert_eq!(load_config_from(&path), config);
    }
}
