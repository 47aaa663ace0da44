//! JSON file backend
//!
//! One flat file holds a `name -> Bookmark` mapping. The owner lives inside
//! each record and is not part of the key, so a name can be held by one
//! owner at a time in this file.
//!
//! Every call loads the whole file, mutates it in memory and writes the whole
//! file back. Writes go to a sibling temp file that is then renamed over the
//! existing file. Read-modify-write cycles are serialized inside this process only;
//! a second process writing the same file can still lose updates.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::BookmarkBackend;
use crate::error::{StoreError, StoreResult};
use crate::model::Bookmark;

const BACKEND: &str = "json file";

type BookmarkMap = BTreeMap<String, Bookmark>;

/// Last-resort bookmark store with no network dependency
pub struct JsonFileBackend {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded data is (), so a poisoned lock carries no broken state
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self) -> StoreResult<BookmarkMap> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BookmarkMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::unavailable(BACKEND, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BookmarkMap::new()),
            Err(e) => Err(StoreError::unavailable(BACKEND, e)),
        }
    }

    fn save(&self, bookmarks: &BookmarkMap) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(bookmarks)
            .map_err(|e| StoreError::unavailable(BACKEND, e))?;

        write_atomically(&self.path, &json).map_err(|e| StoreError::unavailable(BACKEND, e))?;

        debug!(path = %self.path.display(), count = bookmarks.len(), "bookmark file written");
        Ok(())
    }
}

/// Writes `contents` to a sibling `.tmp` file and renames it over `path`,
/// so readers see either the old or the new file and never a torn one
pub(crate) fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)
}

fn owned_by(bookmark: &Bookmark, owner: Option<&str>) -> bool {
    bookmark.owner.as_deref() == owner
}

impl BookmarkBackend for JsonFileBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn list(&self, owner: Option<&str>) -> StoreResult<BTreeMap<String, Bookmark>> {
        let _guard = self.lock();
        let bookmarks = self.load()?;

        Ok(match owner {
            Some(_) => bookmarks
                .into_iter()
                .filter(|(_, bookmark)| owned_by(bookmark, owner))
                .collect(),
            None => bookmarks,
        })
    }

    fn get(&self, name: &str, owner: Option<&str>) -> StoreResult<Bookmark> {
        let _guard = self.lock();
        self.load()?
            .remove(name)
            .filter(|bookmark| owned_by(bookmark, owner))
            .ok_or(StoreError::NotFound)
    }

    fn put(&self, name: &str, bookmark: &Bookmark, owner: Option<&str>) -> StoreResult<()> {
        let _guard = self.lock();
        let mut bookmarks = self.load()?;

        if let Some(existing) = bookmarks.get(name) {
            if !owned_by(existing, owner) {
                return Err(StoreError::NameTaken);
            }
        }

        let mut record = bookmark.clone();
        record.owner = owner.map(str::to_string);
        bookmarks.insert(name.to_string(), record);

        self.save(&bookmarks)
    }

    fn delete(&self, name: &str, owner: Option<&str>) -> StoreResult<()> {
        let _guard = self.lock();
        let mut bookmarks = self.load()?;

        match bookmarks.get(name) {
            Some(existing) if owned_by(existing, owner) => {
                bookmarks.remove(name);
                self.save(&bookmarks)
            }
            _ => Err(StoreError::NotFound),
        }
    }

    fn increment_visits(&self, name: &str, owner: Option<&str>) -> StoreResult<u64> {
        let _guard = self.lock();
        let mut bookmarks = self.load()?;

        let visits = match bookmarks.get_mut(name) {
            Some(existing) if owned_by(existing, owner) => {
                existing.visits += 1;
                existing.visits
            }
            _ => return Err(StoreError::NotFound),
        };

        self.save(&bookmarks)?;
        Ok(visits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend() -> (JsonFileBackend, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = JsonFileBackend::new(dir.path().join("bookmarks.json"));
        (store, dir)
    }

    fn bookmark(url: &str) -> Bookmark {
        Bookmark::new(url.to_string(), "some notes".to_string(), None)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (store, _dir) = backend();
        assert!(store.list(None).unwrap().is_empty());
        assert!(matches!(store.get("docs", None), Err(StoreError::NotFound)));
    }

    #[test]
    fn file_is_a_name_keyed_mapping() {
        let (store, _dir) = backend();
        store.put("docs", &bookmark("http://example.com/docs"), Some("alice")).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["docs"]["url"], "http://example.com/docs");
        assert_eq!(value["docs"]["visits"], 0);
        assert_eq!(value["docs"]["owner"], "alice");
    }

    #[test]
    fn other_owners_records_are_invisible() {
        let (store, _dir) = backend();
        store.put("docs", &bookmark("http://example.com"), Some("alice")).unwrap();

        assert!(matches!(store.get("docs", Some("bob")), Err(StoreError::NotFound)));
        assert!(matches!(store.delete("docs", Some("bob")), Err(StoreError::NotFound)));
        assert!(matches!(
            store.increment_visits("docs", Some("bob")),
            Err(StoreError::NotFound)
        ));
        assert!(store.list(Some("bob")).unwrap().is_empty());
    }

    #[test]
    fn name_held_by_another_owner_cannot_be_overwritten() {
        let (store, _dir) = backend();
        store.put("docs", &bookmark("http://alice.example"), Some("alice")).unwrap();

        let result = store.put("docs", &bookmark("http://bob.example"), Some("bob"));
        assert!(matches!(result, Err(StoreError::NameTaken)));
        assert_eq!(store.get("docs", Some("alice")).unwrap().url, "http://alice.example");
    }

    #[test]
    fn increment_and_delete_persist() {
        let (store, _dir) = backend();
        store.put("docs", &bookmark("http://example.com"), None).unwrap();

        assert_eq!(store.increment_visits("docs", None).unwrap(), 1);
        assert_eq!(store.increment_visits("docs", None).unwrap(), 2);

        let reopened = JsonFileBackend::new(store.path());
        assert_eq!(reopened.get("docs", None).unwrap().visits, 2);

        reopened.delete("docs", None).unwrap();
        assert!(matches!(store.get("docs", None), Err(StoreError::NotFound)));
    }

    #[test]
    fn files_from_earlier_releases_load() {
        let (store, _dir) = backend();
        fs::write(
            store.path(),
            r#"{"docs":{"url":"http://example.com/docs","notes":"","date_added":"2024-01-02 03:04:05","visits":3}}"#,
        )
        .unwrap();

        let found = store.get("docs", None).unwrap();
        assert_eq!(found.visits, 3);
        assert_eq!(found.date_added.to_rfc3339(), "2024-01-02T03:04:05+00:00");

        assert_eq!(store.increment_visits("docs", None).unwrap(), 4);
        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["docs"]["date_added"], "2024-01-02T03:04:05Z");
    }

    #[test]
    fn corrupt_file_is_reported_as_unavailable() {
        let (store, _dir) = backend();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.list(None).unwrap_err().is_unavailable());
    }
}
