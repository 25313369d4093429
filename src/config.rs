//! Configuration loading.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths;

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the database file.
    #[serde(default = "paths::default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: paths::default_data_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from the default config file, falling back to defaults when
    /// it is absent. `TASKSTORE_DATA_DIR` overrides the data directory
    /// either way.
    pub fn load_or_default() -> Self {
        let mut config = Self::load(paths::config_file()).unwrap_or_default();
        if let Ok(dir) = std::env::var("TASKSTORE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config
    }

    /// Path of the SQLite database file inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("tasks.db")
    }

    /// Ensure the data directory exists.
    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.data_dir, paths::default_data_dir());
    }

    #[test]
    fn test_explicit_data_dir() {
        let config: Config = serde_yaml::from_str("data_dir: /tmp/store").unwrap();
        assert_eq!(config.db_path(), PathBuf::from("/tmp/store/tasks.db"));
    }
}
