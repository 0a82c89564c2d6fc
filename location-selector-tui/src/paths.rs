//! Platform-specific directory paths.
//!
//! Uses XDG on Linux, standard locations on macOS/Windows.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

const QUALIFIER: &str = "net";
const ORGANIZATION: &str = "relayselect";
const APPLICATION: &str = "location-selector";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Directory for the cached relay list.
///
/// - Linux: `$XDG_DATA_HOME/location-selector` or `~/.local/share/location-selector`
/// - macOS: `~/Library/Application Support/net.relayselect.location-selector`
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Directory for logs.
///
/// - Linux: `$XDG_CACHE_HOME/location-selector` or `~/.cache/location-selector`
/// - macOS: `~/Library/Caches/net.relayselect.location-selector`
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Where a list loaded with `--relays` is saved, and read back from when
/// `--relays` is not given.
pub fn relays_file() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("relays.json"))
}

pub fn log_file() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("latest.log"))
}

/// Maximum number of old log files to keep.
const MAX_OLD_LOGS: usize = 25;

/// Rename latest.log to a timestamped name and prune old logs.
///
/// Call this at startup before creating the new log file.
pub fn rotate_logs() {
    let Some(cache) = cache_dir() else { return };
    let latest = cache.join("latest.log");

    if latest.exists() {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let archived = cache.join(format!("{}.log", timestamp));
        let _ = fs::rename(&latest, &archived);
    }

    cleanup_old_logs(&cache, MAX_OLD_LOGS);
}

/// Remove archived logs, keeping only the newest `keep`.
fn cleanup_old_logs(dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else { return };

    let mut logs: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.ends_with(".log") && name != "latest.log"
        })
        .collect();

    // Oldest first
    logs.sort_by_key(|e| e.metadata().and_then(|m| m.modified()).ok());

    if logs.len() > keep {
        for entry in logs.iter().take(logs.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    #[test]
    fn test_cleanup_keeps_newest_logs() {
        let dir = std::env::temp_dir().join(format!(
            "location-selector-logs-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();

        let base = SystemTime::now() - Duration::from_secs(100);
        for index in 0..4u64 {
            let path = dir.join(format!("2024010{}_000000.log", index));
            let file = fs::File::create(&path).unwrap();
            file.set_modified(base + Duration::from_secs(index * 10)).unwrap();
        }
        fs::File::create(dir.join("latest.log")).unwrap();

        cleanup_old_logs(&dir, 2);

        let mut names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["20240102_000000.log", "20240103_000000.log", "latest.log"]
        );

        fs::remove_dir_all(&dir).unwrap();
    }
}
