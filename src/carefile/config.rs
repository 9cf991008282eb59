use crate::error::{CarefileError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_FILE_EXT: &str = ".csv";

/// Configuration for a data directory, stored in `<data_dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarefileConfig {
    /// Extension of the collection files (e.g., ".csv", ".txt")
    #[serde(default = "default_file_ext")]
    pub file_ext: String,

    /// Reject saves whose id already exists in the collection
    #[serde(default)]
    pub unique_ids: bool,
}

fn default_file_ext() -> String {
    DEFAULT_FILE_EXT.to_string()
}

impl Default for CarefileConfig {
    fn default() -> Self {
        Self {
            file_ext: default_file_ext(),
            unique_ids: false,
        }
    }
}

impl CarefileConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let mut config: CarefileConfig = serde_json::from_str(&content)?;
        let ext = config.file_ext.clone();
        config.set_file_ext(&ext)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    pub fn file_ext(&self) -> &str {
        &self.file_ext
    }

    /// Set the file extension (normalizes to start with a dot)
    pub fn set_file_ext(&mut self, ext: &str) -> Result<()> {
        let ext = ext.trim();
        let bare = ext.trim_start_matches('.');
        if bare.is_empty() || bare.contains(['/', '\\']) {
            return Err(CarefileError::Config(format!(
                "invalid file extension `{}`",
                ext
            )));
        }
        self.file_ext = format!(".{}", bare);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CarefileConfig::default();
        assert_eq!(config.file_ext, ".csv");
        assert!(!config.unique_ids);
    }

    #[test]
    fn test_set_file_ext_normalizes_dot() {
        let mut config = CarefileConfig::default();
        config.set_file_ext("txt").unwrap();
        assert_eq!(config.file_ext(), ".txt");
        config.set_file_ext(".dat").unwrap();
        assert_eq!(config.file_ext(), ".dat");
    }

    #[test]
    fn test_set_file_ext_rejects_paths_and_empty() {
        let mut config = CarefileConfig::default();
        assert!(config.set_file_ext(".").is_err());
        assert!(config.set_file_ext("a/b").is_err());
        assert_eq!(config.file_ext(), ".csv");
    }

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let config = CarefileConfig::load(dir.path()).unwrap();
        assert_eq!(config, CarefileConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let config = CarefileConfig {
            file_ext: ".txt".to_string(),
            unique_ids: true,
        };
        config.save(dir.path()).unwrap();

        let loaded = CarefileConfig::load(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{"unique_ids": true}"#).unwrap();

        let loaded = CarefileConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.file_ext, ".csv");
        assert!(loaded.unique_ids);
    }

    #[test]
    fn test_load_normalizes_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{"file_ext": "dat"}"#).unwrap();
        assert_eq!(CarefileConfig::load(dir.path()).unwrap().file_ext, ".dat");
    }
}
