// YAML configuration

use crate::storage::{FileStorage, MemoryStorage, SqliteStorage, Storage};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Storage key used when none is configured
pub const DEFAULT_KEY: &str = "neo-brutalism-tasks";

const APP_DIR: &str = "todostore";
const CONFIG_FILE: &str = "config.yaml";
const SQLITE_FILE: &str = "todostore.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Key the task collection is stored under
    pub key: String,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY.to_string(),
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Directory for `file`, database file for `sqlite`; ignored by `memory`
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    #[default]
    File,
    Sqlite,
}

impl Config {
    /// Read a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))?;
        info!(path = ?path, backend = ?config.storage.backend, "Loaded config");
        Ok(config)
    }

    /// Explicit path if given, else the user config file if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }

    /// Where the configured backend keeps its data
    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage.path {
            return Ok(path.clone());
        }
        let base = dirs::data_dir()
            .ok_or_else(|| eyre!("No data directory on this platform; set storage.path"))?
            .join(APP_DIR);
        Ok(match self.storage.backend {
            Backend::Sqlite => base.join(SQLITE_FILE),
            Backend::File | Backend::Memory => base,
        })
    }

    /// Build the configured storage backend
    pub fn open_storage(&self) -> Result<Box<dyn Storage>> {
        let storage: Box<dyn Storage> = match self.storage.backend {
            Backend::Memory => Box::new(MemoryStorage::new()),
            Backend::File => Box::new(FileStorage::open(self.storage_path()?)?),
            Backend::Sqlite => Box::new(SqliteStorage::open(self.storage_path()?)?),
        };
        Ok(storage)
    }
}

/// `<config dir>/todostore/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.key, "neo-brutalism-tasks");
        assert_eq!(config.storage.backend, Backend::File);
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_load_partial_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "storage:\n  backend: sqlite\n  path: /tmp/tasks.db\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.key, DEFAULT_KEY);
        assert_eq!(config.storage.backend, Backend::Sqlite);
        assert_eq!(config.storage_path().unwrap(), PathBuf::from("/tmp/tasks.db"));
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "key: tasks\nstorage:\n  backend: redis\n").unwrap();
        assert!(Config::load(&path).is_err());

        fs::write(&path, "colour: pink\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load_or_default(Some(temp.path().join("nope.yaml").as_path())).is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config {
            key: "work-tasks".to_string(),
            storage: StorageConfig {
                backend: Backend::Memory,
                path: None,
            },
        };
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("backend: memory"));
        assert_eq!(serde_yaml::from_str::<Config>(&yaml).unwrap(), config);
    }

    #[test]
    fn test_open_storage_per_backend() {
        let temp = TempDir::new().unwrap();

        let file = Config {
            key: DEFAULT_KEY.to_string(),
            storage: StorageConfig {
                backend: Backend::File,
                path: Some(temp.path().join("files")),
            },
        };
        let mut storage = file.open_storage().unwrap();
        storage.set_item(DEFAULT_KEY, "[]").unwrap();
        assert!(temp.path().join("files/neo-brutalism-tasks.json").exists());

        let sqlite = Config {
            key: DEFAULT_KEY.to_string(),
            storage: StorageConfig {
                backend: Backend::Sqlite,
                path: Some(temp.path().join("tasks.db")),
            },
        };
        let mut storage = sqlite.open_storage().unwrap();
        storage.set_item(DEFAULT_KEY, "[]").unwrap();
        assert_eq!(storage.get_item(DEFAULT_KEY).unwrap().as_deref(), Some("[]"));

        let memory = Config {
            storage: StorageConfig {
                backend: Backend::Memory,
                path: None,
            },
            ..Config::default()
        };
        let storage = memory.open_storage().unwrap();
        assert_eq!(storage.get_item(DEFAULT_KEY).unwrap(), None);
    }
}
