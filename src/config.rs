//! hostrt Configuration
//!
//! Handles parsing and management of hostrt.toml configuration files.

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for by [`ShimConfig::find_and_load`].
pub const CONFIG_FILE_NAME: &str = "hostrt.toml";

/// Default number of descriptor slots.
pub const DEFAULT_CAPACITY: usize = 128;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid descriptor capacity {0}: must be between 1 and {max}", max = i32::MAX)]
    InvalidCapacity(usize),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching hostrt.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ShimConfig {
    /// Descriptor table settings
    #[serde(default)]
    pub files: FilesConfig,

    /// Child process settings
    #[serde(default)]
    pub process: ProcessConfig,
}

impl ShimConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: ShimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration for the current directory.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir()?;
        Self::find_and_load(&cwd)
    }

    /// Nearest `hostrt.toml` in `start_dir` or one of its ancestors.
    pub fn locate(start_dir: &Path) -> Option<PathBuf> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load the nearest `hostrt.toml`, or the defaults when there is none.
    ///
    /// A file that is found but holds an invalid capacity is an error; it
    /// never silently falls back to the defaults.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        match Self::locate(start_dir) {
            Some(path) => {
                let config = Self::load(&path)?;
                debug!(
                    "loaded {} ({} descriptor slots, chmod via {:?})",
                    path.display(),
                    config.files.capacity,
                    config.process.chmod_program
                );
                Ok(config)
            }
            None => {
                debug!("no {} above {}; using defaults", CONFIG_FILE_NAME, start_dir.display());
                Ok(Self::default())
            }
        }
    }

    /// Save configuration to a file. Invalid settings are refused before
    /// anything is written.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check values that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        let capacity = self.files.capacity;
        if capacity == 0 || capacity > i32::MAX as usize {
            return Err(ConfigError::InvalidCapacity(capacity));
        }
        Ok(())
    }
}

/// Descriptor table configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilesConfig {
    /// Number of descriptor slots
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Child process configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Program invoked to change permission bits
    #[serde(default = "default_chmod_program")]
    pub chmod_program: String,
}

fn default_chmod_program() -> String {
    "chmod".to_string()
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            chmod_program: default_chmod_program(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShimConfig::default();
        assert_eq!(config.files.capacity, 128);
        assert_eq!(config.process.chmod_program, "chmod");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let config = ShimConfig::from_toml_str("[files]\ncapacity = 4\n").unwrap();
        assert_eq!(config.files.capacity, 4);
        assert_eq!(config.process.chmod_program, "chmod");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = ShimConfig::from_toml_str("").unwrap();
        assert_eq!(config, ShimConfig::default());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ShimConfig::from_toml_str("[files]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCapacity(0)));
    }

    #[test]
    fn test_parse_error() {
        let err = ShimConfig::from_toml_str("[files\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_find() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let mut config = ShimConfig::default();
        config.files.capacity = 16;
        config.process.chmod_program = "/bin/chmod".to_string();
        config.save(&dir.path().join(CONFIG_FILE_NAME)).unwrap();

        let found = ShimConfig::find_and_load(&nested).unwrap();
        assert_eq!(found, config);
    }

    #[test]
    fn test_locate_prefers_nearest_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("project");
        std::fs::create_dir_all(nested.join("src")).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[files]\ncapacity = 2\n").unwrap();
        std::fs::write(nested.join(CONFIG_FILE_NAME), "[files]\ncapacity = 3\n").unwrap();
        // A directory with the config name is not a config file
        std::fs::create_dir(nested.join("src").join(CONFIG_FILE_NAME)).unwrap();

        let located = ShimConfig::locate(&nested.join("src")).unwrap();
        assert_eq!(located, nested.join(CONFIG_FILE_NAME));
        assert_eq!(
            ShimConfig::find_and_load(&nested.join("src")).unwrap().files.capacity,
            3
        );
    }

    #[test]
    fn test_find_and_load_rejects_invalid_capacity() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[files]\ncapacity = 0\n").unwrap();

        let err = ShimConfig::find_and_load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCapacity(0)));
    }

    #[test]
    fn test_save_refuses_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut config = ShimConfig::default();
        config.files.capacity = 0;

        assert!(matches!(
            config.save(&path).unwrap_err(),
            ConfigError::InvalidCapacity(0)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ShimConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
