//! Runtime configuration
//!
//! All options are read from environment variables once at startup. A `.env`
//! file in the working directory is honoured for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds every option the service recognizes
///
/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `DOCUMENT_STORE_URL` - Directory holding the document database (default: "data")
/// - `DATABASE_NAME` - Document database file stem (default: "bookmark_db")
/// - `COLLECTION_NAME` - Table holding bookmark documents (default: "bookmarks")
/// - `BOOKMARKS_FILE` - JSON fallback file for bookmarks (default: "bookmarks.json")
/// - `USERS_FILE` - JSON fallback file for accounts (default: "users.json")
/// - `SESSION_IDLE_MINUTES` - Idle time after which a session is forgotten (default: 120)
/// - `RUST_LOG` - Tracing filter (default: "bookmarker=debug,tower_http=debug")
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub document_store_url: String,
    pub database_name: String,
    pub collection_name: String,
    pub bookmarks_file: PathBuf,
    pub users_file: PathBuf,
    pub session_idle_minutes: u64,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            document_store_url: "data".to_string(),
            database_name: "bookmark_db".to_string(),
            collection_name: "bookmarks".to_string(),
            bookmarks_file: PathBuf::from("bookmarks.json"),
            users_file: PathBuf::from("users.json"),
            session_idle_minutes: 120,
            log_filter: "bookmarker=debug,tower_http=debug".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// [`Config::default`] for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Skip .env in unit tests so they stay hermetic
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?,
            Err(_) => defaults.port,
        };

        let session_idle_minutes = match env::var("SESSION_IDLE_MINUTES") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("SESSION_IDLE_MINUTES".to_string(), e.to_string())
            })?,
            Err(_) => defaults.session_idle_minutes,
        };

        Ok(Self {
            port,
            document_store_url: env::var("DOCUMENT_STORE_URL")
                .unwrap_or(defaults.document_store_url),
            database_name: env::var("DATABASE_NAME").unwrap_or(defaults.database_name),
            collection_name: env::var("COLLECTION_NAME").unwrap_or(defaults.collection_name),
            bookmarks_file: env::var("BOOKMARKS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.bookmarks_file),
            users_file: env::var("USERS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.users_file),
            session_idle_minutes,
            log_filter: env::var("RUST_LOG").unwrap_or(defaults.log_filter),
        })
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes.saturating_mul(60))
    }

    /// Full path of the document database file
    pub fn document_store_path(&self) -> PathBuf {
        PathBuf::from(&self.document_store_url).join(format!("{}.redb", self.database_name))
    }
}
