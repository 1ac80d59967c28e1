//! Configuration - backend selection and defaults
//!
//! `DATABASE_URL` selects the networked PostgreSQL engine; otherwise the
//! embedded SQLite engine opens a file under the platform data directory
//! (overridable with `GENBA_DB_PATH`).

use std::path::PathBuf;

use crate::store::{PostgresBackend, SqliteBackend, StorageError, Store};

#[derive(Debug, Default)]
pub struct Config {
    /// PostgreSQL connection URL; presence selects the networked engine.
    pub database_url: Option<String>,

    /// SQLite database file path override.
    pub db_path: Option<PathBuf>,

    /// Default author/submitter name for CLI operations.
    pub author: Option<String>,
}

impl Config {
    /// Load configuration: built-in defaults, then environment variables.
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                config.database_url = Some(url);
            }
        }
        if let Ok(path) = std::env::var("GENBA_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(author) = std::env::var("GENBA_AUTHOR") {
            if !author.is_empty() {
                config.author = Some(author);
            }
        }

        config
    }

    /// Construct the storage adapter this process will use.
    pub fn open_store(&self) -> Result<Store, StorageError> {
        if let Some(url) = &self.database_url {
            let backend = PostgresBackend::connect(url)?;
            return Ok(Store::new(Box::new(backend)));
        }
        let path = self.sqlite_path();
        let backend = SqliteBackend::open(path)?;
        Ok(Store::new(Box::new(backend)))
    }

    /// Resolve the SQLite file path: explicit override, else the platform
    /// data dir, else the working directory.
    pub fn sqlite_path(&self) -> PathBuf {
        if let Some(path) = &self.db_path {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", "genba")
            .map(|dirs| dirs.data_dir().join("genba.db"))
            .unwrap_or_else(|| PathBuf::from("genba.db"))
    }

    /// Default actor username for CLI operations.
    pub fn author(&self) -> String {
        self.author
            .clone()
            .unwrap_or_else(|| "operator".to_string())
    }
}
