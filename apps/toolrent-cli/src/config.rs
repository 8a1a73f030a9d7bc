//! # Configuration
//!
//! Settings for the operator CLI.
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! 1. Defaults
//! 2. toolrent.toml   (--config PATH, or the platform config dir)
//! 3. TOOLRENT_* environment variables
//! 4. --db flag       (applied by main)
//! ```
//!
//! ## Example toolrent.toml
//! ```toml
//! [database]
//! path = "/var/lib/toolrent/toolrent.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [shop]
//! name = "Yunusobod Tool Hire"
//! currency = "UZS"
//! popular_tools_limit = 4
//!
//! [logging]
//! filter = "info,toolrent=debug,sqlx=warn"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toolrent_core::{DEFAULT_POPULAR_TOOLS, DEFAULT_RECENT_RENTALS};
use toolrent_db::DbConfig;

const CONFIG_FILE: &str = "toolrent.toml";
const DATABASE_FILE: &str = "toolrent.db";

/// Default tracing filter when neither RUST_LOG nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,toolrent=debug,sqlx=warn";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine a data directory; set TOOLRENT_DB_PATH or pass --db")]
    NoDataDir,

    #[error("Failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file. `None` means the platform data directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
            busy_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopSettings {
    pub name: String,
    /// Appended to every amount the CLI prints.
    pub currency: String,
    pub popular_tools_limit: u32,
    pub recent_rentals_limit: u32,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            name: "ToolRent".to_string(),
            currency: "UZS".to_string(),
            popular_tools_limit: DEFAULT_POPULAR_TOOLS,
            recent_rentals_limit: DEFAULT_RECENT_RENTALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub shop: ShopSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads defaults, then the config file, then environment overrides.
    ///
    /// An explicit `config_path` must exist; the platform default may be absent.
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML file. Missing sections and keys take their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `TOOLRENT_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("TOOLRENT_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup("TOOLRENT_MAX_CONNECTIONS") {
            self.database.max_connections =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    var: "TOOLRENT_MAX_CONNECTIONS",
                    value,
                })?;
        }

        if let Some(value) = lookup("TOOLRENT_BUSY_TIMEOUT_MS") {
            self.database.busy_timeout_ms =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    var: "TOOLRENT_BUSY_TIMEOUT_MS",
                    value,
                })?;
        }

        if let Some(filter) = lookup("TOOLRENT_LOG") {
            self.logging.filter = filter;
        }

        if let Some(currency) = lookup("TOOLRENT_CURRENCY") {
            self.shop.currency = currency;
        }

        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "database.busy_timeout_ms must be greater than 0".into(),
            ));
        }

        if matches!(&self.database.path, Some(p) if p.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.shop.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("shop.currency must not be empty".into()));
        }

        if self.shop.popular_tools_limit == 0 || self.shop.recent_rentals_limit == 0 {
            return Err(ConfigError::Invalid(
                "shop list limits must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Resolves the database file, creating the platform data dir if needed.
    ///
    /// ## Platform-Specific Paths
    /// - **Linux**: `~/.local/share/toolrent/toolrent.db`
    /// - **macOS**: `~/Library/Application Support/com.toolrent.toolrent/toolrent.db`
    /// - **Windows**: `%APPDATA%\toolrent\toolrent\data\toolrent.db`
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();

        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::CreateDir {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join(DATABASE_FILE))
    }

    /// Builds the pool settings for toolrent-db.
    pub fn db_config(&self) -> ConfigResult<DbConfig> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms)))
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "toolrent", "toolrent")
    }
}
