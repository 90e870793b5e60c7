use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::connection::ConnectionSettings;

/// scratchdb configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HarnessConfig {
    /// Target service connection
    #[serde(default)]
    pub service: ConnectionSettings,

    /// Applications enabled in this process. Skip entries declared for
    /// other applications are ignored.
    #[serde(default)]
    pub apps: Vec<String>,

    /// Extra skip entries on top of the built-in ones, as dotted
    /// `application.test_case.method` identifiers
    #[serde(default)]
    pub skip_tests: Vec<String>,
}

impl HarnessConfig {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .context("Could not determine config directory")
            .map(|d| d.join("scratchdb"))
    }

    /// Get the JSON config file path
    pub fn config_path() -> Result<PathBuf> {
        Self::config_dir().map(|d| d.join("config.json"))
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Load config from the default location, or return default if absent
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            return Self::load_from(&path);
        }
        Ok(Self::default())
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: HarnessConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Enabled applications as a lookup set
    pub fn enabled_apps(&self) -> BTreeSet<String> {
        self.apps.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.service.endpoint, "http://localhost:8686");
        assert_eq!(config.service.database, "app");
        assert!(config.apps.is_empty());
        assert!(config.skip_tests.is_empty());
    }

    #[test]
    fn test_json_deserialization() {
        let json = r#"{
            "service": { "endpoint": "https://db.example.com", "database": "shop" },
            "apps": ["auth", "billing"],
            "skip_tests": ["auth.tests.LoginTests.test_rollback"]
        }"#;
        let config: HarnessConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.service.endpoint, "https://db.example.com");
        assert_eq!(config.service.database, "shop");
        assert_eq!(config.apps, vec!["auth", "billing"]);
        assert_eq!(config.skip_tests.len(), 1);
        assert!(config.service.token.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: HarnessConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.service.database, "app");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = HarnessConfig::default();
        config.service.database = "shop".to_string();
        config.apps = vec!["auth".to_string()];
        config.save_to(&path).expect("save");

        let loaded = HarnessConfig::load_from(&path).expect("load");
        assert_eq!(loaded.service.database, "shop");
        assert_eq!(loaded.apps, vec!["auth"]);
    }

    #[test]
    fn test_enabled_apps_set() {
        let mut config = HarnessConfig::default();
        config.apps = vec!["auth".to_string(), "auth".to_string(), "billing".to_string()];
        let apps = config.enabled_apps();
        assert_eq!(apps.len(), 2);
        assert!(apps.contains("auth"));
        assert!(apps.contains("billing"));
    }
}
