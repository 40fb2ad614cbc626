//! Runtime settings
//!
//! Non-sensitive knobs (retry policy, timeout override) kept in a plain JSON
//! file. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::policy::RetryPolicy;

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Retry behavior for provider calls
    pub retry: RetryPolicy,
    /// Overrides the config's `timeout_seconds` when set
    pub timeout_seconds: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            retry: RetryPolicy::default(),
            timeout_seconds: None,
        }
    }
}

impl Settings {
    /// Effective request timeout given the config's own value
    pub fn timeout_for(&self, config_timeout: u64) -> u64 {
        self.timeout_seconds.unwrap_or(config_timeout)
    }
}

/// Settings manager
pub struct SettingsManager {
    settings: Settings,
}

impl SettingsManager {
    /// Load settings from `path`, falling back to defaults when absent
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Self::load_from_file(path.as_ref())?;
        Ok(Self { settings })
    }

    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::load(temp_dir.path().join("settings.json")).unwrap();

        let settings = manager.get();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.retry, RetryPolicy::default());
        assert_eq!(settings.timeout_for(30), 30);
    }

    #[test]
    fn test_settings_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, r#"{"retry": {"max_retries": 5}, "timeout_seconds": 10}"#).unwrap();

        let manager = SettingsManager::load(&path).unwrap();
        assert_eq!(manager.get().version, 1);
        assert_eq!(manager.get().retry.max_retries, 5);
        assert_eq!(manager.get().timeout_for(30), 10);

        let settings = manager.into_settings();
        assert_eq!(settings.retry.base_delay, RetryPolicy::default().base_delay);
    }

    #[test]
    fn test_invalid_settings_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(SettingsManager::load(&path).is_err());
    }
}
