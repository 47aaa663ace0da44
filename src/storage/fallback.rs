//! Fallback orchestrator
//!
//! Routes every storage call to the document backend when one was initialized
//! at startup. If that call reports [`StoreError::Unavailable`], the same
//! operation is retried against the file backend. Not-found and name-taken
//! answers from the primary are returned as-is.
//!
//! This is a fallback chain, not replication: writes that land in the file
//! while the document store is down are never copied back once it recovers,
//! and the two stores stay diverged.

use std::collections::BTreeMap;

use tracing::{error, warn};

use super::BookmarkBackend;
use crate::error::StoreResult;
use crate::model::Bookmark;

/// One logical bookmark store over a primary and a fallback backend
pub struct FallbackStore {
    primary: Option<Box<dyn BookmarkBackend>>,
    fallback: Box<dyn BookmarkBackend>,
}

impl FallbackStore {
    /// `primary` is `None` when the document store failed to initialize; every
    /// call then goes straight to `fallback`.
    pub fn new(
        primary: Option<Box<dyn BookmarkBackend>>,
        fallback: Box<dyn BookmarkBackend>,
    ) -> Self {
        Self { primary, fallback }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    fn route<T>(
        &self,
        operation: &'static str,
        call: impl Fn(&dyn BookmarkBackend) -> StoreResult<T>,
    ) -> StoreResult<T> {
        if let Some(primary) = &self.primary {
            match call(primary.as_ref()) {
                Err(e) if e.is_unavailable() => {
                    warn!(
                        operation,
                        error = %e,
                        fallback = self.fallback.name(),
                        "primary backend failed, retrying on fallback"
                    );
                }
                answer => return answer,
            }
        }

        let answer = call(self.fallback.as_ref());
        if let Err(e) = &answer {
            if e.is_unavailable() {
                error!(operation, error = %e, "fallback backend failed");
            }
        }
        answer
    }
}

impl BookmarkBackend for FallbackStore {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn list(&self, owner: Option<&str>) -> StoreResult<BTreeMap<String, Bookmark>> {
        self.route("list", |backend| backend.list(owner))
    }

    fn get(&self, name: &str, owner: Option<&str>) -> StoreResult<Bookmark> {
        self.route("get", |backend| backend.get(name, owner))
    }

    fn put(&self, name: &str, bookmark: &Bookmark, owner: Option<&str>) -> StoreResult<()> {
        self.route("put", |backend| backend.put(name, bookmark, owner))
    }

    fn delete(&self, name: &str, owner: Option<&str>) -> StoreResult<()> {
        self.route("delete", |backend| backend.delete(name, owner))
    }

    fn increment_visits(&self, name: &str, owner: Option<&str>) -> StoreResult<u64> {
        self.route("increment_visits", |backend| backend.increment_visits(name, owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::storage::JsonFileBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Backend whose every call fails as if the server were unreachable
    struct Unreachable {
        calls: Arc<AtomicUsize>,
    }

    impl Unreachable {
        fn fail<T>(&self) -> StoreResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::unavailable("document", "connection refused"))
        }
    }

    impl BookmarkBackend for Unreachable {
        fn name(&self) -> &'static str {
            "unreachable"
        }
        fn list(&self, _: Option<&str>) -> StoreResult<BTreeMap<String, Bookmark>> {
            self.fail()
        }
        fn get(&self, _: &str, _: Option<&str>) -> StoreResult<Bookmark> {
            self.fail()
        }
        fn put(&self, _: &str, _: &Bookmark, _: Option<&str>) -> StoreResult<()> {
            self.fail()
        }
        fn delete(&self, _: &str, _: Option<&str>) -> StoreResult<()> {
            self.fail()
        }
        fn increment_visits(&self, _: &str, _: Option<&str>) -> StoreResult<u64> {
            self.fail()
        }
    }

    fn file_backend(dir: &TempDir, file: &str) -> Box<dyn BookmarkBackend> {
        Box::new(JsonFileBackend::new(dir.path().join(file)))
    }

    fn bookmark() -> Bookmark {
        Bookmark::new("http://example.com".to_string(), String::new(), Some("alice"))
    }

    #[test]
    fn unavailable_primary_falls_back_per_call() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let store = FallbackStore::new(
            Some(Box::new(Unreachable { calls: calls.clone() })),
            file_backend(&dir, "fallback.json"),
        );

        store.put("docs", &bookmark(), Some("alice")).unwrap();
        assert_eq!(store.increment_visits("docs", Some("alice")).unwrap(), 1);
        assert_eq!(store.get("docs", Some("alice")).unwrap().visits, 1);

        // The primary is still tried first every time
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn not_found_from_primary_does_not_fall_back() {
        let dir = TempDir::new().unwrap();
        let fallback = JsonFileBackend::new(dir.path().join("fallback.json"));
        fallback.put("docs", &bookmark(), Some("alice")).unwrap();

        let store = FallbackStore::new(
            Some(file_backend(&dir, "primary.json")),
            Box::new(JsonFileBackend::new(dir.path().join("fallback.json"))),
        );

        assert!(matches!(store.get("docs", Some("alice")), Err(StoreError::NotFound)));
    }

    #[test]
    fn missing_primary_uses_fallback_only() {
        let dir = TempDir::new().unwrap();
        let store = FallbackStore::new(None, file_backend(&dir, "fallback.json"));
        assert!(!store.has_primary());

        store.put("docs", &bookmark(), Some("alice")).unwrap();
        assert_eq!(store.list(Some("alice")).unwrap().len(), 1);
    }

    #[test]
    fn both_backends_failing_surfaces_unavailable() {
        let store = FallbackStore::new(
            Some(Box::new(Unreachable { calls: Arc::default() })),
            Box::new(Unreachable { calls: Arc::default() }),
        );
        assert!(store.list(None).unwrap_err().is_unavailable());
    }

    #[test]
    fn writes_during_outage_stay_in_fallback_only() {
        let dir = TempDir::new().unwrap();
        let outage = FallbackStore::new(
            Some(Box::new(Unreachable { calls: Arc::default() })),
            file_backend(&dir, "fallback.json"),
        );
        outage.put("docs", &bookmark(), Some("alice")).unwrap();

        // Primary is back: the outage write is not visible through it
        let recovered = FallbackStore::new(
            Some(file_backend(&dir, "primary.json")),
            file_backend(&dir, "fallback.json"),
        );
        assert!(matches!(recovered.get("docs", Some("alice")), Err(StoreError::NotFound)));
    }
}
