use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::tasks::types::{DEFAULT_WORKERS, FETCH_TIMEOUT};

const CONFIG_FILE_NAME: &str = ".gatorconfig.json";
const DEFAULT_DB_PATH: &str = "gator.db";

/// Per-user settings persisted between invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user_name: Option<String>,
}

impl UserConfig {
    /// Read the config file. A missing file reads as the default config.
    pub fn read(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Self::default()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AppError::Config(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    pub fn write(&self, path: &Path) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|e| {
            AppError::Config(format!("failed to write {}: {e}", path.display()))
        })
    }

    /// Record `name` as the current user and persist the file.
    pub fn set_user(&mut self, path: &Path, name: &str) -> AppResult<()> {
        self.current_user_name = Some(name.to_string());
        self.write(path)
    }
}

/// Process configuration, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub user_config_path: PathBuf,
    pub fetch_timeout: Duration,
    pub workers: usize,
    pub min_refresh_age: Duration,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        let user_config_path = match env::var("GATOR_CONFIG_PATH") {
            Ok(path) => {
                log::info!("Using config path from GATOR_CONFIG_PATH: {}", path);
                PathBuf::from(path)
            }
            Err(_) => default_user_config_path()?,
        };

        let database_url = match env::var("GATOR_DATABASE_URL") {
            Ok(url) => {
                log::info!("Using database from GATOR_DATABASE_URL: {}", url);
                url
            }
            Err(_) => match UserConfig::read(&user_config_path)?.db_url {
                Some(url) => {
                    log::info!("Using database from {}: {}", user_config_path.display(), url);
                    url
                }
                None => {
                    log::info!("Using default database path: {}", DEFAULT_DB_PATH);
                    DEFAULT_DB_PATH.to_string()
                }
            },
        };

        let fetch_timeout = Duration::from_secs(parse_env(
            "GATOR_FETCH_TIMEOUT_SECS",
            FETCH_TIMEOUT.as_secs(),
        )?);
        let workers = parse_env("GATOR_WORKERS", DEFAULT_WORKERS)?;
        let min_refresh_age = Duration::from_secs(parse_env("GATOR_MIN_REFRESH_SECS", 0)?);

        Ok(AppConfig {
            database_url,
            user_config_path,
            fetch_timeout,
            workers,
            min_refresh_age,
        })
    }
}

fn default_user_config_path() -> AppResult<PathBuf> {
    let home = env::var_os("HOME")
        .ok_or_else(|| AppError::Config("HOME is not set; set GATOR_CONFIG_PATH".to_string()))?;
    Ok(PathBuf::from(home).join(CONFIG_FILE_NAME))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: '{raw}'"))),
        Err(_) => Ok(default),
    }
}
