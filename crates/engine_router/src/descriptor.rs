//! Static configuration for one evaluation spot

use serde::{Deserialize, Serialize};

/// Configuration of one evaluation backend ("spot")
///
/// Loaded once from the descriptor source. Only `enabled` changes at runtime,
/// through [`crate::BackendRegistry::enable`] / [`crate::BackendRegistry::disable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Unique identifier, used as the registry key
    pub id: String,
    /// Base URL, e.g. `http://10.0.0.5:8080`
    pub address: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Higher is preferred
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl BackendDescriptor {
    pub fn new(id: impl Into<String>, address: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            region: None,
            priority,
            enabled: true,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Join a path onto the base address without doubling slashes
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.address.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_optional_fields_missing() {
        let json = r#"{"id": "spot-1", "address": "http://localhost:9000"}"#;
        let descriptor: BackendDescriptor = serde_json::from_str(json).expect("Should deserialize");

        assert_eq!(descriptor.priority, 0);
        assert!(descriptor.enabled);
        assert!(descriptor.region.is_none());
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let descriptor = BackendDescriptor::new("a", "http://host:1/", 1);
        assert_eq!(descriptor.endpoint("/analyze"), "http://host:1/analyze");
        assert_eq!(descriptor.endpoint("health"), "http://host:1/health");
    }
}
