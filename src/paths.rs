//! Default filesystem locations.

use std::path::PathBuf;

/// Default data directory, under the platform data dir
/// (e.g. `~/.local/share/taskstore` on Linux). Falls back to a
/// `.taskstore` directory in the working directory when the platform
/// dir cannot be determined.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("taskstore"))
        .unwrap_or_else(|| PathBuf::from(".taskstore"))
}

/// Location of the optional YAML config file.
pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("taskstore").join("config.yaml"))
        .unwrap_or_else(|| PathBuf::from("taskstore.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_data_dir_is_named() {
        let dir = default_data_dir();
        assert!(dir.ends_with("taskstore") || dir.ends_with(".taskstore"));
    }

    #[test]
    fn test_config_file_is_yaml() {
        let path = config_file();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("yaml"));
    }
}
