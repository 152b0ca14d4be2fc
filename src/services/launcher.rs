use crate::error::{Result, RunnerError};
use std::process::Command;
use tracing::info;

/// Receives the URL of a chosen candidate
pub trait BrowserLauncher: Send + Sync {
    fn invoke(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the desktop's default browser
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl BrowserLauncher for SystemLauncher {
    fn invoke(&self, url: &str) -> Result<()> {
        let mut command = open_command();
        command.arg(url);
        command.spawn().map_err(|source| RunnerError::Launch {
            url: url.to_string(),
            source,
        })?;
        info!("Opened {}", url);
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn open_command() -> Command {
    Command::new("explorer.exe")
}

#[cfg(target_os = "macos")]
fn open_command() -> Command {
    Command::new("open")
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn open_command() -> Command {
    Command::new("xdg-open")
}
