use std::path::{Path, PathBuf};

/// Canonical form of `path` used to compare watcher events with source paths.
///
/// The file and some of its directories may not exist yet, so the closest
/// existing ancestor is resolved and the missing components are kept as given.
pub fn normalize_path(path: &Path) -> PathBuf {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        if let (Ok(canonical), Ok(rest)) = (ancestor.canonicalize(), path.strip_prefix(ancestor)) {
            return canonical.join(rest);
        }
    }
    path.to_path_buf()
}

/// Chromium's profile layout below a home directory
pub fn chromium_config_dir(home: &Path) -> PathBuf {
    home.join(".config").join("chromium")
}
