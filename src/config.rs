//! Persistent application configuration model and defaults.

use std::path::PathBuf;

use crate::sorting::{AscendingMode, SortKey};

const APP_DIR_NAME: &str = "tunedex";

/// Root configuration persisted to `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Library indexing and view preferences.
    pub library: LibraryConfig,
    #[serde(default)]
    /// Catalog storage location.
    pub database: DatabaseConfig,
    #[serde(default)]
    /// Log output preferences.
    pub logging: LoggingConfig,
}

/// Library indexing and view preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LibraryConfig {
    /// Scan roots handed to the external scanner.
    #[serde(default)]
    pub folders: Vec<String>,
    /// Sort applied to list views at startup.
    #[serde(default)]
    pub default_sort: SortKey,
    /// How `asc` sorts relate to the canonical `desc` comparator.
    #[serde(default)]
    pub ascending_mode: AscendingMode,
    /// Re-apply collapsed folders after the storage tree is rebuilt.
    #[serde(default)]
    pub preserve_closed_folders: bool,
}

/// Catalog database location. An empty path means the per-user data directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: String,
}

/// Log output preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

/// Persisted log verbosity.
#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            default_sort: SortKey::Default,
            ascending_mode: AscendingMode::PrimaryOnly,
            preserve_closed_folders: false,
        }
    }
}

/// Default location of `config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config.toml"))
}

/// Default location of the catalog database.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join("library.db"))
}

impl DatabaseConfig {
    /// Configured database path, falling back to the per-user data directory.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        let trimmed = self.path.trim();
        if trimmed.is_empty() {
            default_database_path()
        } else {
            Some(PathBuf::from(trimmed))
        }
    }
}

/// Trims and de-duplicates scan folders, dropping blank entries.
pub fn sanitize_config(config: Config) -> Config {
    let mut folders: Vec<String> = Vec::with_capacity(config.library.folders.len());
    for folder in config.library.folders {
        let trimmed = folder.trim();
        if trimmed.is_empty() || folders.iter().any(|existing| existing == trimmed) {
            continue;
        }
        folders.push(trimmed.to_string());
    }

    Config {
        library: LibraryConfig {
            folders,
            ..config.library
        },
        database: DatabaseConfig {
            path: config.database.path.trim().to_string(),
        },
        logging: config.logging,
    }
}
