//! Optional JSON config file with defaults for the command line.
//!
//! Looked up at `--config` or `<config_dir>/route-planner/config.json`.
//! Command-line flags always win over the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub stops: Vec<(String, String)>,
    pub modes: Option<Vec<String>>,
    pub mode: Option<String>,
    pub fallback_mode: Option<String>,
    pub ants: Option<String>,
    pub iterations: Option<String>,
    pub reduced: Option<bool>,
    pub render_target: Option<String>,
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("route-planner").join("config.json"))
}

/// Load an explicit config file, or the default one if it exists.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig> {
    match explicit {
        Some(path) => read(path),
        None => match default_path() {
            Some(path) if path.exists() => read(&path),
            _ => Ok(FileConfig::default()),
        },
    }
}

fn read(path: &Path) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg = serde_json::from_str(&raw)
        .with_context(|| format!("parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_partial_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"base_url": "http://planner.local", "timeout": "750ms", "stops": [["A", "B"]], "mode": "fastest"}}"#
        )
        .unwrap();

        let cfg = load(Some(f.path())).unwrap();
        assert_eq!(cfg.base_url.as_deref(), Some("http://planner.local"));
        assert_eq!(cfg.timeout, Some(Duration::from_millis(750)));
        assert_eq!(cfg.stops, vec![("A".to_string(), "B".to_string())]);
        assert_eq!(cfg.mode.as_deref(), Some("fastest"));
        assert!(cfg.ants.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"num_ants": "10"}}"#).unwrap();
        let err = load(Some(f.path())).unwrap_err();
        assert!(format!("{err:#}").contains("parse config"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("nope.json"))).is_err());
    }
}
