//! Bookmark persistence
//!
//! [`BookmarkBackend`] is the single contract the route handlers see. Two
//! implementations exist: [`document::DocumentBackend`] on the embedded
//! document database and [`json_file::JsonFileBackend`] on a flat JSON file.
//! [`fallback::FallbackStore`] combines them into one logical store.
//!
//! # Owner scope
//!
//! `owner = Some(id)` addresses one user's namespace. `owner = None` addresses
//! the unscoped namespace, except in [`BookmarkBackend::list`] where it means
//! "no filter".

use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};
use crate::model::Bookmark;

pub mod document;
pub mod fallback;
pub mod json_file;

pub use document::DocumentBackend;
pub use fallback::FallbackStore;
pub use json_file::JsonFileBackend;

/// Storage contract shared by every bookmark backend
///
/// Every mutating call is durable before it returns.
pub trait BookmarkBackend: Send + Sync {
    /// Short label used in logs and errors
    fn name(&self) -> &'static str;

    /// All bookmarks in `owner`'s scope, or every bookmark when `owner` is `None`
    fn list(&self, owner: Option<&str>) -> StoreResult<BTreeMap<String, Bookmark>>;

    fn get(&self, name: &str, owner: Option<&str>) -> StoreResult<Bookmark>;

    /// Upsert: creates the bookmark or overwrites the one with the same key.
    /// The stored record's owner is always `owner`.
    fn put(&self, name: &str, bookmark: &Bookmark, owner: Option<&str>) -> StoreResult<()>;

    fn delete(&self, name: &str, owner: Option<&str>) -> StoreResult<()>;

    /// Adds one visit and returns the new count
    fn increment_visits(&self, name: &str, owner: Option<&str>) -> StoreResult<u64>;

    /// `Ok(false)` on not-found, errors only when the backend fails
    fn exists(&self, name: &str, owner: Option<&str>) -> StoreResult<bool> {
        match self.get(name, owner) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
