//! Router configuration
//!
//! Descriptors come from a JSON array, either inline in the `ENGINE_SPOTS`
//! environment variable or in the file named by `ENGINE_SPOTS_FILE`. A bad
//! entry is skipped with a logged reason; only an unreadable or non-array
//! document is fatal.
//!
//! ```text
//! ENGINE_SPOTS='[{"id":"eu-1","address":"http://10.0.0.5:8080","region":"eu","priority":100}]'
//! ENGINE_MAX_RETRIES=2
//! ENGINE_TIMEOUT_MS=10000
//! ENGINE_FALLBACK=local
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::descriptor::BackendDescriptor;
use crate::error::ConfigError;

pub const ENV_SPOTS: &str = "ENGINE_SPOTS";
pub const ENV_SPOTS_FILE: &str = "ENGINE_SPOTS_FILE";
pub const ENV_MAX_RETRIES: &str = "ENGINE_MAX_RETRIES";
pub const ENV_TIMEOUT_MS: &str = "ENGINE_TIMEOUT_MS";
pub const ENV_FALLBACK: &str = "ENGINE_FALLBACK";

/// What the router does once every backend attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Surface `AllBackendsFailed`
    Off,
    /// Use the local heuristic evaluator
    #[default]
    Local,
    /// Local when an evaluator is installed, otherwise off
    Auto,
}

impl FromStr for FallbackMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "false" => Ok(FallbackMode::Off),
            "local" | "local_heuristic" | "heuristic" => Ok(FallbackMode::Local),
            "auto" => Ok(FallbackMode::Auto),
            _ => Err(ConfigError::InvalidValue {
                key: ENV_FALLBACK.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Tunables of the orchestrator and its HTTP clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Per-attempt timeout
    #[serde(with = "millis")]
    pub attempt_timeout: Duration,
    /// Timeout of the out-of-band health probe
    #[serde(with = "millis")]
    pub probe_timeout: Duration,
    pub fallback: FallbackMode,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            attempt_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(2),
            fallback: FallbackMode::default(),
        }
    }
}

impl RouterConfig {
    /// Overlay environment values onto `self`
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(value) = std::env::var(ENV_MAX_RETRIES) {
            self.max_retries = parse_env(ENV_MAX_RETRIES, &value)?;
        }
        if let Ok(value) = std::env::var(ENV_TIMEOUT_MS) {
            self.attempt_timeout = Duration::from_millis(parse_env(ENV_TIMEOUT_MS, &value)?);
        }
        if let Ok(value) = std::env::var(ENV_FALLBACK) {
            self.fallback = value.parse()?;
        }
        Ok(self)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Parse a descriptor document, skipping malformed entries individually
pub fn parse_descriptors(document: &str) -> Result<Vec<BackendDescriptor>, ConfigError> {
    let value: Value = serde_json::from_str(document).map_err(|e| ConfigError::Document {
        message: e.to_string(),
    })?;
    let Value::Array(entries) = value else {
        return Err(ConfigError::Document {
            message: "top-level value must be an array".to_string(),
        });
    };

    let mut descriptors = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<BackendDescriptor>(entry) {
            Ok(descriptor) if descriptor.id.trim().is_empty() => {
                warn!(index = idx, "skipping descriptor: empty id");
            }
            Ok(descriptor) if descriptor.address.trim().is_empty() => {
                warn!(index = idx, id = %descriptor.id, "skipping descriptor: empty address");
            }
            Ok(descriptor) => descriptors.push(descriptor),
            Err(err) => warn!(index = idx, reason = %err, "skipping malformed descriptor"),
        }
    }
    Ok(descriptors)
}

/// Read descriptors from a JSON file
pub fn load_descriptors_file(path: &Path) -> Result<Vec<BackendDescriptor>, ConfigError> {
    let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_descriptors(&document)
}

/// Resolve descriptors from `ENGINE_SPOTS`, then `ENGINE_SPOTS_FILE`
///
/// Returns an empty list when neither is set.
pub fn load_descriptors_from_env() -> Result<Vec<BackendDescriptor>, ConfigError> {
    if let Ok(document) = std::env::var(ENV_SPOTS) {
        return parse_descriptors(&document);
    }
    if let Ok(path) = std::env::var(ENV_SPOTS_FILE) {
        return load_descriptors_file(Path::new(&path));
    }
    Ok(Vec::new())
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_malformed_entries_are_skipped() {
        let document = r#"[
            {"id": "eu-1", "address": "http://eu-1:8080", "region": "eu", "priority": 100},
            {"id": "broken", "priority": "high"},
            {"address": "http://no-id"},
            {"id": "", "address": "http://empty-id"},
            42,
            {"id": "us-1", "address": "http://us-1:8080", "enabled": false}
        ]"#;

        let descriptors = parse_descriptors(document).expect("document is an array");
        let ids: Vec<&str> = descriptors.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["eu-1", "us-1"]);
        assert_eq!(descriptors[0].region.as_deref(), Some("eu"));
        assert!(!descriptors[1].enabled);
    }

    #[test]
    fn test_non_array_document_is_fatal() {
        assert!(matches!(
            parse_descriptors(r#"{"id": "x"}"#),
            Err(ConfigError::Document { .. })
        ));
        assert!(matches!(parse_descriptors("[oops"), Err(ConfigError::Document { .. })));
    }

    #[test]
    fn test_load_descriptors_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"[{{"id": "local", "address": "http://127.0.0.1:9000"}}]"#)
            .expect("write descriptors");

        let descriptors = load_descriptors_file(file.path()).expect("Should load");
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].id, "local");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_descriptors_file(Path::new("/definitely/not/here.json"))
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_fallback_mode_parsing() {
        assert_eq!("off".parse::<FallbackMode>().ok(), Some(FallbackMode::Off));
        assert_eq!("LOCAL".parse::<FallbackMode>().ok(), Some(FallbackMode::Local));
        assert_eq!(" auto ".parse::<FallbackMode>().ok(), Some(FallbackMode::Auto));
        assert!("sometimes".parse::<FallbackMode>().is_err());
    }

    #[test]
    fn test_router_config_serde_uses_millis() {
        let config: RouterConfig =
            serde_json::from_str(r#"{"max_retries": 4, "attempt_timeout": 2500, "fallback": "off"}"#)
                .expect("Should deserialize");
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.attempt_timeout, Duration::from_millis(2500));
        assert_eq!(config.probe_timeout, Duration::from_secs(2));
        assert_eq!(config.fallback, FallbackMode::Off);
    }
}
