use crate::error::AppError;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "storage.json";
const STORE_ENV_VAR: &str = "NEWTON_STORE_PATH";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEntries {
    schema_version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("newton").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("newton")
            .join(STORE_FILE_NAME))
    }
}

/// Key-value store kept in one JSON document on disk. Every `set` rewrites
/// the whole file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_path()?))
    }

    fn load(&self) -> Result<StoredEntries, AppError> {
        if !self.path.exists() {
            return Ok(StoredEntries {
                schema_version: SCHEMA_VERSION,
                entries: BTreeMap::new(),
            });
        }

        let content = std::fs::read_to_string(&self.path)?;
        let stored: StoredEntries = serde_json::from_str(&content)?;

        if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
            return Err(AppError::invalid_data("schema_version mismatch"));
        }

        Ok(stored)
    }

    fn save(&self, stored: &StoredEntries) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(stored)?;
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&staging, permissions)?;
        }

        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.load()?.entries.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let mut stored = match self.load() {
            Ok(stored) => stored,
            Err(AppError::InvalidData(msg)) => {
                warn!(
                    path = %self.path.display(),
                    error = %msg,
                    "store document unreadable, overwriting"
                );
                StoredEntries::default()
            }
            Err(err) => return Err(err),
        };
        stored.schema_version = SCHEMA_VERSION;
        stored.entries.insert(key.to_string(), value.to_string());
        self.save(&stored)
    }
}
