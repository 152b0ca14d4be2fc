//! File watcher for the profile sources
//!
//! Uses the `notify` crate to watch the directories holding the source files and
//! forwards debounced "created"/"modified" notifications for the registered paths
//! to a callback. Directories are watched rather than the files themselves, as
//! the browser replaces some of them by renaming a temporary file over them.
//!
//! When a source's directory does not exist yet, its closest existing ancestor is
//! watched instead, and the watch moves down as the missing directories appear.

use crate::error::Result;
use crate::utils::path_utils::normalize_path;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Debounce delay in milliseconds
pub const DEBOUNCE_DELAY_MS: u64 = 500;

/// How often pending events are checked
const TICK: Duration = Duration::from_millis(100);

/// File event types we handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventType {
    Created,
    Modified,
}

/// A file event with debouncing support
#[derive(Debug, Clone)]
struct PendingEvent {
    event_type: FileEventType,
    timestamp: Instant,
}

type Callback = Box<dyn Fn(&Path, FileEventType) + Send + 'static>;

/// The notify handle and the directories registered with it
struct WatchState {
    watcher: Option<RecommendedWatcher>,
    watched_dirs: Vec<PathBuf>,
}

impl WatchState {
    /// Watches the closest existing directory on the way to `target`.
    fn watch_towards(&mut self, target: &Path) {
        let Some(dir) = nearest_existing_dir(target) else {
            warn!("Not watching {:?}: no existing parent directory", target);
            return;
        };
        if self.watched_dirs.contains(&dir) {
            return;
        }
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        match watcher.watch(&dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!("Watching directory: {:?}", dir);
                self.watched_dirs.push(dir);
            }
            Err(e) => warn!("Failed to watch directory {:?}: {}", dir, e),
        }
    }
}

fn lock_state(state: &Mutex<WatchState>) -> std::sync::MutexGuard<'_, WatchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn nearest_existing_dir(target: &Path) -> Option<PathBuf> {
    target
        .ancestors()
        .skip(1)
        .find(|dir| dir.is_dir())
        .map(Path::to_path_buf)
}

/// Watches a fixed set of files until stopped or dropped
pub struct ChangeWatcher {
    state: Arc<Mutex<WatchState>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ChangeWatcher {
    /// Starts watching `paths`, calling `on_change` from a background thread.
    ///
    /// Events for a path are coalesced until it has been quiet for `debounce`.
    pub fn start<F>(paths: &[PathBuf], debounce: Duration, on_change: F) -> Result<Self>
    where
        F: Fn(&Path, FileEventType) + Send + 'static,
    {
        let (tx, rx) = channel();

        let watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(e) => warn!("Watch error: {}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let targets: HashSet<PathBuf> = paths.iter().map(|p| normalize_path(p)).collect();

        let mut state = WatchState {
            watcher: Some(watcher),
            watched_dirs: Vec::new(),
        };
        for target in &targets {
            state.watch_towards(target);
        }
        info!(
            "File watcher started for {} directories",
            state.watched_dirs.len()
        );
        let state = Arc::new(Mutex::new(state));

        let running = Arc::new(AtomicBool::new(true));
        let worker = {
            let running = running.clone();
            let state = state.clone();
            let on_change: Callback = Box::new(on_change);
            thread::Builder::new()
                .name("chromium-runner-watcher".to_string())
                .spawn(move || {
                    Self::process_events(rx, targets, state, debounce, running, on_change)
                })?
        };

        Ok(Self {
            state,
            running,
            worker: Some(worker),
        })
    }

    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        lock_state(&self.state).watched_dirs.clone()
    }

    /// Unregisters all watches and waits for the event thread to finish.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        {
            let mut state = lock_state(&self.state);
            let dirs: Vec<PathBuf> = state.watched_dirs.drain(..).collect();
            if let Some(mut watcher) = state.watcher.take() {
                for dir in dirs {
                    let _ = watcher.unwatch(&dir);
                }
            }
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("File watcher thread panicked");
            }
            info!("File watcher stopped");
        }
    }

    /// Processes events from the receiver with debouncing
    fn process_events(
        rx: Receiver<Event>,
        targets: HashSet<PathBuf>,
        state: Arc<Mutex<WatchState>>,
        debounce: Duration,
        running: Arc<AtomicBool>,
        on_change: Callback,
    ) {
        let mut pending: HashMap<PathBuf, PendingEvent> = HashMap::new();

        while running.load(Ordering::SeqCst) {
            match rx.recv_timeout(TICK) {
                Ok(event) => {
                    let new_dirs = Self::handle_notify_event(event, &targets, &mut pending);
                    for dir in new_dirs {
                        Self::handle_new_dir(&dir, &targets, &state, &mut pending);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let now = Instant::now();
            let mut ready = Vec::new();
            pending.retain(|path, event| {
                if now.duration_since(event.timestamp) >= debounce {
                    ready.push((path.clone(), event.event_type));
                    false
                } else {
                    true
                }
            });

            for (path, event_type) in ready {
                if !running.load(Ordering::SeqCst) {
                    return;
                }
                debug!("{:?} event for {:?}", event_type, path);
                on_change(&path, event_type);
            }
        }
    }

    /// Handles a raw notify event and adds it to pending events.
    ///
    /// Returns the directories that appeared on the way to a target.
    fn handle_notify_event(
        event: Event,
        targets: &HashSet<PathBuf>,
        pending: &mut HashMap<PathBuf, PendingEvent>,
    ) -> Vec<PathBuf> {
        let event_type = match event.kind {
            EventKind::Create(_) => FileEventType::Created,
            EventKind::Modify(_) => FileEventType::Modified,
            _ => return Vec::new(),
        };

        let mut new_dirs = Vec::new();
        for path in event.paths {
            let path = normalize_path(&path);
            if !targets.contains(&path) {
                let leads_to_target = targets.iter().any(|t| t != &path && t.starts_with(&path));
                if leads_to_target && path.is_dir() {
                    new_dirs.push(path);
                }
                continue;
            }
            record(pending, path, event_type);
        }
        new_dirs
    }

    /// Moves the watches below a newly created `dir` and picks up targets that
    /// were created before the watch was in place.
    fn handle_new_dir(
        dir: &Path,
        targets: &HashSet<PathBuf>,
        state: &Mutex<WatchState>,
        pending: &mut HashMap<PathBuf, PendingEvent>,
    ) {
        let mut state = lock_state(state);
        for target in targets.iter().filter(|t| t.starts_with(dir)) {
            state.watch_towards(target);
            if target.is_file() {
                record(pending, target.clone(), FileEventType::Created);
            }
        }
    }
}

fn record(pending: &mut HashMap<PathBuf, PendingEvent>, path: PathBuf, event_type: FileEventType) {
    // a creation followed by writes is still reported as created
    let event_type = match pending.get(&path) {
        Some(prev) if prev.event_type == FileEventType::Created => FileEventType::Created,
        _ => event_type,
    };
    pending.insert(
        path,
        PendingEvent {
            event_type,
            timestamp: Instant::now(),
        },
    );
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use std::fs;
    use tempfile::TempDir;

    fn event(kind: EventKind, path: &Path) -> Event {
        Event::new(kind).add_path(path.to_path_buf())
    }

    #[test]
    fn test_handle_event_filters_targets() {
        let dir = TempDir::new().unwrap();
        let bookmarks = dir.path().join("Bookmarks");
        let targets: HashSet<PathBuf> = [normalize_path(&bookmarks)].into_iter().collect();
        let mut pending = HashMap::new();

        ChangeWatcher::handle_notify_event(
            event(EventKind::Modify(ModifyKind::Any), &dir.path().join("Bookmarks.bak")),
            &targets,
            &mut pending,
        );
        assert!(pending.is_empty());

        ChangeWatcher::handle_notify_event(
            event(EventKind::Remove(RemoveKind::File), &bookmarks),
            &targets,
            &mut pending,
        );
        assert!(pending.is_empty());

        ChangeWatcher::handle_notify_event(
            event(EventKind::Create(CreateKind::File), &bookmarks),
            &targets,
            &mut pending,
        );
        ChangeWatcher::handle_notify_event(
            event(EventKind::Modify(ModifyKind::Any), &bookmarks),
            &targets,
            &mut pending,
        );
        assert_eq!(pending.len(), 1);
        assert_eq!(
            pending.values().next().unwrap().event_type,
            FileEventType::Created
        );
    }

    #[test]
    fn test_handle_event_reports_dirs_leading_to_target() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join(".config");
        let targets: HashSet<PathBuf> = [normalize_path(&profile.join("chromium").join("Bookmarks"))]
            .into_iter()
            .collect();
        let mut pending = HashMap::new();

        fs::create_dir(&profile).unwrap();
        fs::create_dir(dir.path().join("unrelated")).unwrap();

        let new_dirs = ChangeWatcher::handle_notify_event(
            event(EventKind::Create(CreateKind::Folder), &profile),
            &targets,
            &mut pending,
        );
        assert_eq!(new_dirs, vec![normalize_path(&profile)]);
        assert!(pending.is_empty());

        let new_dirs = ChangeWatcher::handle_notify_event(
            event(EventKind::Create(CreateKind::Folder), &dir.path().join("unrelated")),
            &targets,
            &mut pending,
        );
        assert!(new_dirs.is_empty());
    }

    #[test]
    fn test_nearest_existing_dir() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a").join("b").join("Bookmarks");
        assert_eq!(nearest_existing_dir(&target).unwrap(), dir.path());

        fs::create_dir_all(dir.path().join("a").join("b")).unwrap();
        assert_eq!(
            nearest_existing_dir(&target).unwrap(),
            dir.path().join("a").join("b")
        );
    }

    #[test]
    fn test_start_and_stop() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            dir.path().join("Bookmarks"),
            dir.path().join("missing").join("Local State"),
        ];

        let mut watcher =
            ChangeWatcher::start(&paths, Duration::from_millis(10), |_, _| {}).unwrap();
        assert_eq!(watcher.watched_dirs().len(), 1);
        watcher.stop();
        assert!(watcher.watched_dirs().is_empty());
    }
}
