use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::extract::{ExtractOptions, RetentionPolicy, TopologyPolicy};
use crate::BundleMode;

/// User configuration for tblsplit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which parts travel with each extracted table
    pub retention: RetentionPolicy,

    /// Whether tables wrapped in a block content control count as top-level
    pub topology: TopologyPolicy,

    /// How outputs are written to disk
    pub bundle: BundleMode,

    /// Directory for outputs; the current directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Extract the tables of a document in parallel
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            retention: RetentionPolicy::Conservative,
            topology: TopologyPolicy::Direct,
            bundle: BundleMode::PerDocument,
            output_dir: None,
            parallel: true,
        }
    }
}

impl Config {
    /// Load config from the config directory
    pub fn load() -> Result<Self> {
        if let Some(config_path) = Self::get_config_path() {
            if config_path.exists() {
                return Self::load_from(&config_path);
            }
        }

        // Return default config if no file found
        Ok(Config::default())
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the config directory
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::get_config_path() {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let content = toml::to_string_pretty(self)?;
            fs::write(&config_path, content)?;
        }

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tblsplit").join("config.toml"))
    }

    /// Initialize default config file
    pub fn init_default() -> Result<()> {
        let config = Config::default();
        config.save()?;
        Ok(())
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            retention: self.retention,
            topology: self.topology,
            parallel: self.parallel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("retention = \"minimal\"").unwrap();
        assert_eq!(config.retention, RetentionPolicy::Minimal);
        assert_eq!(config.topology, TopologyPolicy::Direct);
        assert_eq!(config.bundle, BundleMode::PerDocument);
        assert!(config.parallel);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config {
            retention: RetentionPolicy::Minimal,
            topology: TopologyPolicy::Controls,
            bundle: BundleMode::Combined,
            output_dir: Some(PathBuf::from("out")),
            parallel: false,
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "topology = \"controls\"\nbundle = \"none\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.topology, TopologyPolicy::Controls);
        assert_eq!(config.bundle, BundleMode::None);
        assert_eq!(config.extract_options().topology, TopologyPolicy::Controls);
    }
}
