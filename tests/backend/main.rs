use chromium_runner::{
    BrowserLauncher, Candidate, Result, Runner, Source, SourcePaths, DEFAULT_GOOGLE_URL,
};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[derive(Default, Clone)]
struct RecordingLauncher {
    opened: Arc<Mutex<Vec<String>>>,
}

impl BrowserLauncher for RecordingLauncher {
    fn invoke(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

fn write_keywords(path: &Path, rows: &[(&str, &str, &str)]) {
    let _ = fs::remove_file(path);
    let conn = Connection::open(path).unwrap();
    conn.execute(
        "CREATE TABLE keywords (id INTEGER PRIMARY KEY, short_name TEXT NOT NULL, keyword TEXT NOT NULL, url TEXT NOT NULL)",
        [],
    )
    .unwrap();
    for (short_name, keyword, url) in rows {
        conn.execute(
            "INSERT INTO keywords (short_name, keyword, url) VALUES (?1, ?2, ?3)",
            [short_name, keyword, url],
        )
        .unwrap();
    }
}

fn write_bookmarks(path: &Path, entries: &[(&str, &str)]) {
    let children: Vec<serde_json::Value> = entries
        .iter()
        .map(|(name, url)| serde_json::json!({"type": "url", "name": name, "url": url}))
        .collect();
    let doc = serde_json::json!({
        "roots": {
            "bookmark_bar": {"type": "folder", "name": "Bookmarks bar", "children": children},
            "other": {"type": "folder", "name": "Other", "children": []}
        },
        "version": 1
    });
    fs::write(path, doc.to_string()).unwrap();
}

fn profile(dir: &TempDir) -> SourcePaths {
    let paths = SourcePaths::from_home(dir.path());
    fs::create_dir_all(paths.bookmarks.parent().unwrap()).unwrap();
    paths
}

#[test]
fn test_full_profile_matching() {
    let dir = TempDir::new().unwrap();
    let paths = profile(&dir);
    write_keywords(
        &paths.web_data,
        &[
            ("Google", "g", "{google:baseURL}search?{google:RLZ}q={searchTerms}"),
            ("Wikipedia", "w", "https://en.wikipedia.org/w/index.php?search={searchTerms}"),
            ("Wiktionary", "w", "https://en.wiktionary.org/?search={searchTerms}"),
        ],
    );
    write_bookmarks(
        &paths.bookmarks,
        &[("GitHub", "https://github.com"), ("Rust docs", "https://doc.rust-lang.org")],
    );
    fs::write(
        &paths.local_state,
        r#"{"browser": {"last_known_google_url": "https://www.google.de/"}}"#,
    )
    .unwrap();

    let runner = Runner::start(paths, None, Box::new(RecordingLauncher::default())).unwrap();

    let results = runner.match_query("w rust");
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].url(),
        "https://en.wikipedia.org/w/index.php?search=rust"
    );

    let results = runner.match_query("rust");
    assert_eq!(results.len(), 1);
    assert!(matches!(&results[0], Candidate::Bookmark { name, .. } if name == "Rust docs"));

    let results = runner.match_query("g rust lang");
    assert_eq!(
        results[0].url(),
        "https://www.google.de/search?q=g+rust+lang&qf=f"
    );

    assert_eq!(runner.match_query("GIT").len(), 1);
    assert!(runner.match_query("w r").is_empty());
}

#[test]
fn test_reload_replaces_slices_independently() {
    let dir = TempDir::new().unwrap();
    let paths = profile(&dir);
    write_keywords(&paths.web_data, &[("Google", "g", "{searchTerms}")]);
    write_bookmarks(&paths.bookmarks, &[("GitHub", "https://github.com")]);
    fs::write(
        &paths.local_state,
        r#"{"browser": {"last_known_google_url": "https://www.google.fr"}}"#,
    )
    .unwrap();

    let runner = Runner::start(paths.clone(), None, Box::new(RecordingLauncher::default())).unwrap();
    assert_eq!(&*runner.snapshot().base_search_url, "https://www.google.fr");

    write_bookmarks(&paths.bookmarks, &[("GitLab", "https://gitlab.com")]);
    assert_eq!(runner.on_file_event(&paths.bookmarks), Some(Source::Bookmarks));
    let snap = runner.snapshot();
    assert_eq!(snap.bookmarks[0].name, "GitLab");
    assert_eq!(snap.keywords.len(), 1);
    assert_eq!(&*snap.base_search_url, "https://www.google.fr");

    // removing the key resets to the default instead of keeping the old value
    fs::write(&paths.local_state, r#"{"browser": {}}"#).unwrap();
    runner.reload(Source::BaseSearchUrl).unwrap();
    assert_eq!(&*runner.snapshot().base_search_url, DEFAULT_GOOGLE_URL);

    // a vanished keyword database keeps the last loaded keywords
    fs::remove_file(&paths.web_data).unwrap();
    assert_eq!(runner.on_file_event(&paths.web_data), Some(Source::Keywords));
    assert_eq!(runner.snapshot().keywords.len(), 1);
}

#[test]
fn test_run_opens_resolved_url() {
    let dir = TempDir::new().unwrap();
    let paths = profile(&dir);
    write_keywords(&paths.web_data, &[("Crates", "c", "https://crates.io/search?q={searchTerms}")]);

    let launcher = RecordingLauncher::default();
    let opened = launcher.opened.clone();
    let runner = Runner::start(paths, None, Box::new(launcher)).unwrap();

    let results = runner.match_query("c serde");
    runner.run(&results[0]).unwrap();
    assert_eq!(
        *opened.lock().unwrap(),
        vec!["https://crates.io/search?q=serde".to_string()]
    );
}

#[test]
fn test_watcher_reloads_changed_bookmarks() {
    let dir = TempDir::new().unwrap();
    let paths = profile(&dir);
    write_bookmarks(&paths.bookmarks, &[("GitHub", "https://github.com")]);

    let mut runner = Runner::start(
        paths.clone(),
        Some(Duration::from_millis(50)),
        Box::new(RecordingLauncher::default()),
    )
    .unwrap();
    assert!(runner.is_watching());
    assert_eq!(runner.match_query("codeberg").len(), 0);

    write_bookmarks(&paths.bookmarks, &[("Codeberg", "https://codeberg.org")]);

    let deadline = Instant::now() + Duration::from_secs(10);
    while runner.match_query("codeberg").is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(runner.match_query("codeberg").len(), 1);

    runner.stop();
    assert!(!runner.is_watching());
}

#[test]
fn test_watcher_picks_up_profile_created_later() {
    let dir = TempDir::new().unwrap();
    let paths = SourcePaths::from_home(dir.path());

    let runner = Runner::start(
        paths.clone(),
        Some(Duration::from_millis(50)),
        Box::new(RecordingLauncher::default()),
    )
    .unwrap();
    assert!(runner.snapshot().bookmarks.is_empty());

    fs::create_dir_all(paths.bookmarks.parent().unwrap()).unwrap();
    write_bookmarks(&paths.bookmarks, &[("Codeberg", "https://codeberg.org")]);

    let deadline = Instant::now() + Duration::from_secs(10);
    while runner.snapshot().bookmarks.is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(runner.snapshot().bookmarks.len(), 1);
    assert_eq!(runner.match_query("codeberg").len(), 1);
}
