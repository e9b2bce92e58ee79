//! Default filesystem locations
//!
//! Linux: `$XDG_CONFIG_HOME/smoketest/config.toml`
//! macOS: `~/Library/Application Support/smoketest/config.toml`

use std::path::{Path, PathBuf};

/// Application name used for configuration directories
const APP_NAME: &str = "smoketest";

/// Get the configuration directory
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default settings file path
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Resolve a `path` named inside `document`
///
/// Relative paths are taken from the working directory first. When nothing
/// exists there, the path next to `document` is used if that exists.
/// Otherwise the working-directory path is returned so a read error names
/// it. Absolute paths are returned unchanged.
pub fn resolve_relative(document: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    let beside = document.parent().unwrap_or(Path::new(".")).join(path);
    if beside.exists() {
        beside
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_directory_wins() {
        // Tests run from the package root
        let resolved = resolve_relative(Path::new("src/main.yml"), Path::new("src/lib.rs"));
        assert_eq!(resolved, PathBuf::from("src/lib.rs"));
    }

    #[test]
    fn test_falls_back_to_the_document_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shop-endpoints.yml"), "[]").unwrap();

        let resolved = resolve_relative(
            &dir.path().join("main.yml"),
            Path::new("shop-endpoints.yml"),
        );
        assert_eq!(resolved, dir.path().join("shop-endpoints.yml"));
    }

    #[test]
    fn test_missing_everywhere_names_the_working_directory_path() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_relative(&dir.path().join("main.yml"), Path::new("nowhere.yml"));
        assert_eq!(resolved, PathBuf::from("nowhere.yml"));
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let resolved = resolve_relative(Path::new("suites/main.yml"), Path::new("/etc/shop.yml"));
        assert_eq!(resolved, PathBuf::from("/etc/shop.yml"));
    }

    #[test]
    fn test_config_path_ends_with_file_name() {
        if let Some(path) = config_path() {
            assert!(path.ends_with("config.toml"));
        }
    }
}
