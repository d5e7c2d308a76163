//! Configuration loading
//!
//! Reads `config.toml` from the data directory. Every field has a default, so
//! a missing file or section behaves like an empty one.

use crate::error::{Error, Result};
use crate::exchange::sheet::DEFAULT_HEADER_SCAN_ROWS;
use crate::persistence::DEFAULT_STATE_FILE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// File name of the configuration inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    /// Rules for creating and deleting tabs
    #[serde(default)]
    pub tabs: TabPolicy,

    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// File holding the serialized state
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

fn default_state_file() -> String {
    DEFAULT_STATE_FILE.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

/// Tab lifecycle policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabPolicy {
    /// Maximum number of tabs, unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tabs: Option<usize>,

    /// Refuse to delete the first tab
    #[serde(default)]
    pub protect_first_tab: bool,

    /// Prefix for generated tab names ("Tab 1", "Tab 2", ...)
    #[serde(default = "default_name_prefix")]
    pub default_name_prefix: String,
}

fn default_name_prefix() -> String {
    "Tab".to_string()
}

impl Default for TabPolicy {
    fn default() -> Self {
        Self {
            max_tabs: None,
            protect_first_tab: false,
            default_name_prefix: default_name_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Rows searched for a spreadsheet header
    #[serde(default = "default_header_scan_rows")]
    pub header_scan_rows: usize,

    /// Sample keys shown per side when reconciliation matches nothing
    #[serde(default = "default_diagnostic_samples")]
    pub diagnostic_samples: usize,
}

fn default_header_scan_rows() -> usize {
    DEFAULT_HEADER_SCAN_ROWS
}

fn default_diagnostic_samples() -> usize {
    5
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: default_header_scan_rows(),
            diagnostic_samples: default_diagnostic_samples(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        Self::load(&config_path).unwrap_or_else(|e| {
            warn!(path = %config_path.display(), error = %e, "ignoring invalid config");
            Self::default()
        })
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))
    }

    fn validate(&self) -> Result<()> {
        if self.storage.state_file.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "storage.state_file cannot be empty".to_string(),
            ));
        }
        if self.tabs.max_tabs == Some(0) {
            return Err(Error::InvalidConfig("tabs.max_tabs must be >= 1".to_string()));
        }
        if self.tabs.default_name_prefix.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "tabs.default_name_prefix cannot be empty".to_string(),
            ));
        }
        if self.import.header_scan_rows == 0 {
            return Err(Error::InvalidConfig(
                "import.header_scan_rows must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_when_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from_dir(temp_dir.path());
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.storage.state_file, "work_planner.json");
        assert_eq!(cfg.tabs.max_tabs, None);
        assert_eq!(cfg.import.header_scan_rows, 25);
        assert_eq!(cfg.import.diagnostic_samples, 5);
    }

    #[test]
    fn test_load_parses_overrides() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
[tabs]
max_tabs = 5
protect_first_tab = true

[import]
header_scan_rows = 20
"#,
        )
        .unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.tabs.max_tabs, Some(5));
        assert!(cfg.tabs.protect_first_tab);
        assert_eq!(cfg.tabs.default_name_prefix, "Tab");
        assert_eq!(cfg.import.header_scan_rows, 20);
        assert_eq!(cfg.import.diagnostic_samples, 5);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[import]\nheader_scan_rows = 0\n").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::InvalidConfig(_))));
        assert_eq!(Config::load_from_dir(temp_dir.path()), Config::default());

        std::fs::write(&path, "[tabs\n").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_save_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        let mut cfg = Config::default();
        cfg.tabs.max_tabs = Some(3);
        cfg.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), cfg);
    }
}
