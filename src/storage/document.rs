//! Document store backend
//!
//! Each bookmark is one JSON document in a redb table named after the
//! configured collection.
//!
//! Key: `"{owner}:{name}"`, with an empty owner segment for unscoped documents
//! Value: JSON-serialized [`BookmarkDocument`]
//!
//! Example:
//! - Key: "0b0d6c1e-5f7a-4d8e-9c1b-2a3f4e5d6c7b:docs"
//! - Value: '{"name":"docs","url":"http://example.com/docs","visits":2,...}'
//!
//! Owner ids never contain `:`, so a range over `"{owner}:".."{owner};"`
//! yields exactly one user's documents.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::BookmarkBackend;
use crate::error::{StoreError, StoreResult};
use crate::model::{timestamp, Bookmark};

const BACKEND: &str = "document";

/// Bookmark as stored in the document table
///
/// Every field but `name` tolerates absence so that documents written by
/// older versions still load; see [`BookmarkDocument::into_bookmark`].
#[derive(Serialize, Deserialize, Debug, Clone)]
struct BookmarkDocument {
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    notes: String,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    date_added: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    date_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    visits: u64,
    #[serde(default)]
    owner: Option<String>,
}

impl BookmarkDocument {
    fn from_bookmark(name: &str, bookmark: &Bookmark, owner: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            url: bookmark.url.clone(),
            notes: bookmark.notes.clone(),
            date_added: Some(bookmark.date_added),
            date_modified: bookmark.date_modified,
            visits: bookmark.visits,
            owner: owner.map(str::to_string),
        }
    }

    /// Overwrites the mutable fields in place, keeping name and owner
    fn apply(&mut self, bookmark: &Bookmark) {
        self.url = bookmark.url.clone();
        self.notes = bookmark.notes.clone();
        self.date_added = Some(bookmark.date_added);
        self.date_modified = bookmark.date_modified;
        self.visits = bookmark.visits;
    }

    fn into_bookmark(self) -> Bookmark {
        Bookmark {
            url: self.url,
            notes: self.notes,
            date_added: self.date_added.unwrap_or_else(timestamp::epoch),
            date_modified: self.date_modified,
            visits: self.visits,
            owner: self.owner,
        }
    }
}

fn scoped_key(name: &str, owner: Option<&str>) -> String {
    format!("{}:{}", owner.unwrap_or(""), name)
}

fn backend_err<E: Into<redb::Error>>(err: E) -> StoreError {
    let err: redb::Error = err.into();
    StoreError::unavailable(BACKEND, err)
}

fn decode(raw: &str) -> StoreResult<BookmarkDocument> {
    serde_json::from_str(raw).map_err(|e| StoreError::unavailable(BACKEND, e))
}

fn encode(document: &BookmarkDocument) -> StoreResult<String> {
    serde_json::to_string(document).map_err(|e| StoreError::unavailable(BACKEND, e))
}

/// Bookmark backend on the embedded document database
pub struct DocumentBackend {
    db: Arc<Database>,
    collection: String,
}

impl DocumentBackend {
    /// The collection table must already exist; see [`crate::database::init_db`].
    pub fn new(db: Arc<Database>, collection: impl Into<String>) -> Self {
        Self {
            db,
            collection: collection.into(),
        }
    }

    fn table(&self) -> TableDefinition<'_, &'static str, &'static str> {
        TableDefinition::new(&self.collection)
    }

    fn read_document(&self, key: &str) -> StoreResult<Option<BookmarkDocument>> {
        let read_txn = self.db.begin_read().map_err(backend_err)?;
        let table = read_txn.open_table(self.table()).map_err(backend_err)?;

        let raw = table
            .get(key)
            .map_err(backend_err)?
            .map(|guard| guard.value().to_string());

        match raw {
            Some(raw) => decode(&raw).map(Some),
            None => Ok(None),
        }
    }
}

impl BookmarkBackend for DocumentBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn list(&self, owner: Option<&str>) -> StoreResult<BTreeMap<String, Bookmark>> {
        let read_txn = self.db.begin_read().map_err(backend_err)?;
        let table = read_txn.open_table(self.table()).map_err(backend_err)?;

        let mut raw_documents = Vec::new();
        match owner {
            // Range over this owner's key prefix only
            Some(owner) => {
                let start_key = format!("{}:", owner);
                let end_key = format!("{};", owner);
                for entry in table
                    .range(start_key.as_str()..end_key.as_str())
                    .map_err(backend_err)?
                {
                    let (_, value) = entry.map_err(backend_err)?;
                    raw_documents.push(value.value().to_string());
                }
            }
            // Unfiltered listing for legacy callers
            None => {
                for entry in table.iter().map_err(backend_err)? {
                    let (_, value) = entry.map_err(backend_err)?;
                    raw_documents.push(value.value().to_string());
                }
            }
        }

        let mut bookmarks = BTreeMap::new();
        for raw in raw_documents {
            let document = decode(&raw)?;
            bookmarks.insert(document.name.clone(), document.into_bookmark());
        }
        Ok(bookmarks)
    }

    fn get(&self, name: &str, owner: Option<&str>) -> StoreResult<Bookmark> {
        self.read_document(&scoped_key(name, owner))?
            .map(BookmarkDocument::into_bookmark)
            .ok_or(StoreError::NotFound)
    }

    fn put(&self, name: &str, bookmark: &Bookmark, owner: Option<&str>) -> StoreResult<()> {
        let key = scoped_key(name, owner);

        let write_txn = self.db.begin_write().map_err(backend_err)?;
        {
            let mut table = write_txn.open_table(self.table()).map_err(backend_err)?;

            let existing = table
                .get(key.as_str())
                .map_err(backend_err)?
                .map(|guard| guard.value().to_string());

            let document = match existing {
                Some(raw) => {
                    let mut document = decode(&raw)?;
                    document.apply(bookmark);
                    debug!(name, "updating bookmark document in place");
                    document
                }
                None => {
                    debug!(name, "inserting new bookmark document");
                    BookmarkDocument::from_bookmark(name, bookmark, owner)
                }
            };

            let json = encode(&document)?;
            table
                .insert(key.as_str(), json.as_str())
                .map_err(backend_err)?;
        }
        write_txn.commit().map_err(backend_err)?;

        Ok(())
    }

    fn delete(&self, name: &str, owner: Option<&str>) -> StoreResult<()> {
        let key = scoped_key(name, owner);

        let write_txn = self.db.begin_write().map_err(backend_err)?;
        {
            let mut table = write_txn.open_table(self.table()).map_err(backend_err)?;
            let removed = table.remove(key.as_str()).map_err(backend_err)?.is_some();
            if !removed {
                return Err(StoreError::NotFound);
            }
        }
        write_txn.commit().map_err(backend_err)?;

        Ok(())
    }

    fn increment_visits(&self, name: &str, owner: Option<&str>) -> StoreResult<u64> {
        let key = scoped_key(name, owner);

        // Read and write share one write transaction, which redb serializes
        let write_txn = self.db.begin_write().map_err(backend_err)?;
        let visits = {
            let mut table = write_txn.open_table(self.table()).map_err(backend_err)?;

            let raw = table
                .get(key.as_str())
                .map_err(backend_err)?
                .map(|guard| guard.value().to_string())
                .ok_or(StoreError::NotFound)?;

            let mut document = decode(&raw)?;
            document.visits += 1;

            let json = encode(&document)?;
            table
                .insert(key.as_str(), json.as_str())
                .map_err(backend_err)?;
            document.visits
        };
        write_txn.commit().map_err(backend_err)?;

        Ok(visits)
    }
}
