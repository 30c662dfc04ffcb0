use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

fn default_database_path() -> String {
    "data".to_string()
}

fn default_database_max_connections() -> u32 {
    8
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            database_max_connections: default_database_max_connections(),
        }
    }
}

impl AppConfig {
    const CONFIG_ENV: &'static str = "ATELIER_CONFIG_FILE";
    const DATABASE_PATH_ENV: &'static str = "ATELIER_DATABASE_PATH";
    const DATABASE_MAX_CONNECTIONS_ENV: &'static str = "ATELIER_DATABASE_MAX_CONNECTIONS";

    /// Load configuration from defaults layered with an optional config file
    /// and environment variables.
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    pub fn load_with(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::resolve_config_path(config_path) {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            config = toml::from_str(&contents)
                .with_context(|| format!("invalid config file: {}", path.display()))?;
        }

        if let Ok(path) = env::var(Self::DATABASE_PATH_ENV) {
            config.database_path = path;
        }

        if let Ok(value) = env::var(Self::DATABASE_MAX_CONNECTIONS_ENV) {
            config.database_max_connections = value.parse().with_context(|| {
                format!("invalid {name}", name = Self::DATABASE_MAX_CONNECTIONS_ENV)
            })?;
        }

        Ok(config)
    }

    fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
        if explicit.is_some() {
            return explicit;
        }

        env::var(Self::CONFIG_ENV).ok().map(PathBuf::from)
    }

    /// Treat the configured path as a database file when it names one, and
    /// as a data directory otherwise.
    pub fn database_path_is_file(&self) -> bool {
        self.database_path.ends_with(".db") || self.database_path.ends_with(".sqlite")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let config = AppConfig::default();
        assert_eq!(config.database_path, "data");
        assert_eq!(config.database_max_connections, 8);
    }

    #[test]
    fn file_paths_are_detected() {
        let mut config = AppConfig::default();
        config.database_path = "atelier.db".into();
        assert!(config.database_path_is_file());

        config.database_path = "state".into();
        assert!(!config.database_path_is_file());
    }
}
