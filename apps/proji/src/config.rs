//! Application configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `PROJI__SECTION__KEY` environment variables.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{ProjiError, Result};

const ENV_PREFIX: &str = "PROJI";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; falls back to the platform data directory when unset
    pub path: Option<PathBuf>,
}

/// Settings shared by the remote tree fetchers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub github_api: String,
    pub gitlab_api: String,
    pub per_page: u32,
    /// Upper bound on pages followed before a fetch is abandoned
    pub max_pages: u32,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            github_api: "https://api.github.com".to_string(),
            gitlab_api: "https://gitlab.com/api/v4".to_string(),
            per_page: 100,
            max_pages: 1000,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.remote.per_page == 0 {
            return Err(ProjiError::config("remote.per_page must be greater than 0"));
        }
        if self.remote.max_pages == 0 {
            return Err(ProjiError::config("remote.max_pages must be greater than 0"));
        }
        if self.remote.timeout_secs == 0 {
            return Err(ProjiError::config(
                "remote.timeout_secs must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Resolve the database file location
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => default_database_path(),
        }
    }
}

fn default_database_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("io", "proji", "proji")
        .ok_or_else(|| ProjiError::config("Failed to determine project directories"))?;

    Ok(proj_dirs.data_dir().join("proji.sqlite3"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.remote.per_page, 100);
        assert_eq!(config.remote.max_pages, 1000);
        assert_eq!(config.remote.gitlab_api, "https://gitlab.com/api/v4");
        assert!(config.database.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("proji.toml");
        fs::write(
            &file,
            r#"
            [database]
            path = "/tmp/proji-test.sqlite3"

            [remote]
            max_pages = 5
            "#,
        )
        .unwrap();

        let config = Config::load(Some(file.as_path())).unwrap();
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/proji-test.sqlite3")
        );
        assert_eq!(config.remote.max_pages, 5);
        // untouched keys keep their defaults
        assert_eq!(config.remote.per_page, 100);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(dir.path().join("missing.toml").as_path())).unwrap_err();
        assert!(matches!(err, ProjiError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_page_limit() {
        let mut config = Config::default();
        config.remote.max_pages = 0;
        assert!(matches!(config.validate(), Err(ProjiError::Config(_))));
    }
}
