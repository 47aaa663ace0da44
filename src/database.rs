//! Document store initialization and the shared application context
//!
//! The document database is opened once at startup. When that fails the
//! service still comes up, with bookmarks and accounts kept in JSON files.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, TableDefinition};
use tracing::{info, warn};

use crate::config::Config;
use crate::session::SessionStore;
use crate::storage::{BookmarkBackend, DocumentBackend, FallbackStore, JsonFileBackend};
use crate::users::{DocumentUserStore, JsonUserStore, UserStore};

/// Table for storing accounts
///
/// Key: username
/// Value: JSON-serialized User
pub const TABLE_USERS: TableDefinition<&str, &str> = TableDefinition::new("users");

/// Creates or opens the database file and makes sure both tables exist
///
/// # Arguments
///
/// * `db_path` - File path of the database (e.g., "data/bookmark_db.redb")
/// * `collection` - Name of the bookmark table
pub fn init_db(db_path: &Path, collection: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        let bookmarks: TableDefinition<&str, &str> = TableDefinition::new(collection);
        write_txn.open_table(bookmarks)?;
        write_txn.open_table(TABLE_USERS)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// Application state shared across all request handlers
///
/// Built once at startup and injected into every handler through axum's
/// `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub bookmarks: Arc<FallbackStore>,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(bookmarks: FallbackStore, users: Arc<dyn UserStore>) -> Self {
        Self {
            bookmarks: Arc::new(bookmarks),
            users,
            sessions: SessionStore::default(),
        }
    }

    /// Opens the document store described by `config`, falling back to the
    /// JSON files when it cannot be initialized.
    pub fn from_config(config: &Config) -> Self {
        Self {
            sessions: SessionStore::new(config.session_idle_timeout()),
            ..Self::open_stores(config)
        }
    }

    fn open_stores(config: &Config) -> Self {
        let file_backend = Box::new(JsonFileBackend::new(&config.bookmarks_file));
        let db_path = config.document_store_path();

        if let Err(e) = std::fs::create_dir_all(&config.document_store_url) {
            warn!(dir = %config.document_store_url, error = %e, "cannot create document store directory");
        }

        match init_db(&db_path, &config.collection_name) {
            Ok(db) => {
                info!(path = %db_path.display(), collection = %config.collection_name, "document store ready");
                let db = Arc::new(db);
                let primary: Box<dyn BookmarkBackend> =
                    Box::new(DocumentBackend::new(db.clone(), config.collection_name.clone()));
                Self::new(
                    FallbackStore::new(Some(primary), file_backend),
                    Arc::new(DocumentUserStore::new(db)),
                )
            }
            Err(e) => {
                warn!(
                    path = %db_path.display(),
                    error = %e,
                    "document store unavailable, using JSON files only"
                );
                Self::new(
                    FallbackStore::new(None, file_backend),
                    Arc::new(JsonUserStore::new(&config.users_file)),
                )
            }
        }
    }
}
