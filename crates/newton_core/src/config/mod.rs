use crate::error::AppError;
use crate::timeline::{
    DEFAULT_COOLDOWN, DEFAULT_EXPAND_BY_DAYS, DEFAULT_INITIAL_RADIUS_DAYS, TimelineSettings,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "NEWTON_CONFIG_PATH";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Acting user when storage has none recorded.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub timeline: TimelineConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub initial_radius_days: u32,
    pub expand_by_days: u32,
    pub cooldown_ms: u64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            initial_radius_days: DEFAULT_INITIAL_RADIUS_DAYS,
            expand_by_days: DEFAULT_EXPAND_BY_DAYS,
            cooldown_ms: u64::try_from(DEFAULT_COOLDOWN.as_millis()).unwrap_or(800),
        }
    }
}

impl TimelineConfig {
    /// An increment of zero would make edge reports useless, so it is raised
    /// to one day.
    pub fn settings(&self) -> TimelineSettings {
        TimelineSettings {
            initial_radius_days: self.initial_radius_days,
            expand_by_days: self.expand_by_days.max(1),
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub user: Option<String>,
    pub initial_radius_days: Option<u32>,
    pub expand_by_days: Option<u32>,
    pub cooldown_ms: Option<u64>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("newton").join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("newton")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    Ok(normalize_user(config))
}

fn normalize_user(mut config: Config) -> Config {
    config.user = config
        .user
        .map(|user| user.trim().to_string())
        .filter(|user| !user.is_empty());
    config
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(user) = overrides.user.as_deref().map(str::trim)
        && !user.is_empty()
    {
        merged.user = Some(user.to_string());
    }
    if let Some(days) = overrides.initial_radius_days {
        merged.timeline.initial_radius_days = days;
    }
    if let Some(days) = overrides.expand_by_days {
        merged.timeline.expand_by_days = days;
    }
    if let Some(millis) = overrides.cooldown_ms {
        merged.timeline.cooldown_ms = millis;
    }
    merged
}
