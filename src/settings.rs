//! Analysis settings
//!
//! Loaded from an optional JSON file, then overlaid with the `ENGINE_*`
//! environment variables. A missing or unreadable file is not an error: the
//! defaults are used and a warning is logged.
//!
//! ```json
//! {
//!   "router": { "max_retries": 2, "attempt_timeout": 10000, "probe_timeout": 2000, "fallback": "local" },
//!   "depth": 14,
//!   "multipv": 3
//! }
//! ```

use std::fs;
use std::path::Path;

use engine_router::RouterConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AnalysisError, AnalysisResult};

pub const DEFAULT_DEPTH: u32 = 14;
pub const DEFAULT_MULTIPV: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub router: RouterConfig,
    /// Search depth requested from backends
    pub depth: u32,
    /// Candidate lines requested for the position before the move
    pub multipv: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            router: RouterConfig::default(),
            depth: DEFAULT_DEPTH,
            multipv: DEFAULT_MULTIPV,
        }
    }
}

impl Settings {
    /// Read `path`, falling back to defaults when absent or invalid
    pub fn load(path: Option<&Path>) -> Settings {
        let Some(path) = path else {
            return Settings::default();
        };
        if !path.exists() {
            info!("[SETTINGS] No settings file found at {:?}. Using defaults.", path);
            return Settings::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
                Ok(settings) => {
                    info!("[SETTINGS] Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!(
                        "[SETTINGS] Failed to parse settings file at {:?}: {}. Using defaults.",
                        path, e
                    );
                    Settings::default()
                }
            },
            Err(e) => {
                warn!(
                    "[SETTINGS] Failed to read settings file at {:?}: {}. Using defaults.",
                    path, e
                );
                Settings::default()
            }
        }
    }

    /// File settings with the environment applied on top
    pub fn resolve(path: Option<&Path>) -> AnalysisResult<Settings> {
        let mut settings = Settings::load(path);
        settings.router = settings.router.apply_env()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> AnalysisResult<()> {
        let io_err = |source| AnalysisError::SettingsIo {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_err)?;
        info!("[SETTINGS] Saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_router::FallbackMode;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.depth, 14);
        assert_eq!(settings.multipv, 3);
        assert_eq!(settings.router.max_retries, 2);
        assert_eq!(settings.router.fallback, FallbackMode::Local);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::load(Some(&dir.path().join("absent.json")));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").expect("write");
        assert_eq!(Settings::load(Some(&path)), Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"depth": 20, "router": {"fallback": "off"}}"#).expect("write");
        let settings = Settings::load(Some(&path));
        assert_eq!(settings.depth, 20);
        assert_eq!(settings.multipv, 3);
        assert_eq!(settings.router.fallback, FallbackMode::Off);
        assert_eq!(settings.router.attempt_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default();
        settings.multipv = 5;
        settings.router.attempt_timeout = Duration::from_millis(2500);
        settings.save(&path).expect("save");
        assert_eq!(Settings::load(Some(&path)), settings);
    }
}
