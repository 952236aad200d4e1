//! Scenario file locations
//!
//! The scenario file is looked up in the working directory first, then in the
//! platform configuration directory:
//! - Linux: `~/.config/s3-minitest/`
//! - macOS: `~/Library/Application Support/s3-minitest/`
//! - Windows: `%APPDATA%\s3-minitest\`

use std::path::{Path, PathBuf};

/// Name used for the configuration directory
const APP_NAME: &str = "s3-minitest";

/// File names tried in each searched directory, in order
const SCENARIO_FILE_NAMES: &[&str] = &["minitest.yaml", "minitest.yml", "minitest.toml"];

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Every location searched for a scenario file when none is given explicitly
pub fn scenario_candidates(cwd: &Path) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = SCENARIO_FILE_NAMES
        .iter()
        .map(|name| cwd.join(name))
        .collect();

    if let Some(dir) = config_dir() {
        candidates.extend(SCENARIO_FILE_NAMES.iter().map(|name| dir.join(name)));
    }

    candidates
}

/// Find the scenario file
///
/// An explicit path is returned as-is when it exists. Otherwise the
/// candidates from [`scenario_candidates`] are tried in order. On failure the
/// list of searched paths is returned so it can be reported.
pub fn find_scenario_file(explicit: Option<&Path>) -> std::result::Result<PathBuf, Vec<PathBuf>> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(vec![path.to_path_buf()])
        };
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let candidates = scenario_candidates(&cwd);

    match candidates.iter().find(|p| p.is_file()) {
        Some(found) => Ok(found.clone()),
        None => Err(candidates),
    }
}

/// Whether a scenario file should be parsed as TOML rather than YAML
pub fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_start_in_working_directory() {
        let cwd = Path::new("/work");
        let candidates = scenario_candidates(cwd);
        assert_eq!(candidates[0], PathBuf::from("/work/minitest.yaml"));
        assert_eq!(candidates[2], PathBuf::from("/work/minitest.toml"));
    }

    #[test]
    fn test_explicit_missing_path_is_reported() {
        let missing = Path::new("/definitely/not/here/minitest.yaml");
        let err = find_scenario_file(Some(missing)).unwrap_err();
        assert_eq!(err, vec![missing.to_path_buf()]);
    }

    #[test]
    fn test_explicit_existing_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "scenarios: {}\n").unwrap();
        assert_eq!(find_scenario_file(Some(&path)).unwrap(), path);
    }

    #[test]
    fn test_is_toml() {
        assert!(is_toml(Path::new("a/minitest.TOML")));
        assert!(!is_toml(Path::new("minitest.yaml")));
        assert!(!is_toml(Path::new("minitest")));
    }
}
