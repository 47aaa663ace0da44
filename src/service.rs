//! Bookmark rules layered over any [`BookmarkBackend`]
//!
//! The route handlers call these functions with the orchestrated store; the
//! unit tests call them with a plain file backend.

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{AppError, StoreError};
use crate::model::{Bookmark, BookmarkForm};
use crate::storage::BookmarkBackend;
use crate::validation::{is_valid_url, normalize_url};

fn checked_url(raw: &str) -> Result<String, AppError> {
    let url = normalize_url(raw);
    if is_valid_url(&url) {
        Ok(url)
    } else {
        Err(AppError::InvalidUrl)
    }
}

fn checked_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        Err(AppError::EmptyName)
    } else {
        Ok(name.to_string())
    }
}

/// Creates a bookmark; the name must be free in `owner`'s scope
///
/// Returns the stored name and record.
pub fn add_bookmark(
    store: &dyn BookmarkBackend,
    owner: Option<&str>,
    form: &BookmarkForm,
) -> Result<(String, Bookmark), AppError> {
    let name = checked_name(&form.custom_name)?;
    let url = checked_url(&form.url)?;

    if store.exists(&name, owner)? {
        return Err(StoreError::NameTaken.into());
    }

    let bookmark = Bookmark::new(url, form.notes.clone(), owner);
    store.put(&name, &bookmark, owner)?;
    info!(name = %name, url = %bookmark.url, "bookmark added");

    Ok((name, bookmark))
}

/// Updates url and notes of `current_name`, renaming it when the form carries
/// a different name
///
/// `date_added` and `visits` are carried over and `date_modified` is
/// refreshed. A rename writes the new key first and only then deletes the old
/// one, so a rejected write leaves the bookmark where it was. Returns the name
/// the bookmark ends up under.
pub fn edit_bookmark(
    store: &dyn BookmarkBackend,
    owner: Option<&str>,
    current_name: &str,
    form: &BookmarkForm,
) -> Result<String, AppError> {
    let mut bookmark = store.get(current_name, owner)?;

    let url = checked_url(&form.url)?;
    let new_name = checked_name(&form.custom_name)?;
    let renamed = new_name != current_name;

    if renamed && store.exists(&new_name, owner)? {
        return Err(StoreError::NameTaken.into());
    }

    bookmark.url = url;
    bookmark.notes = form.notes.clone();
    bookmark.date_modified = Some(Utc::now());

    store.put(&new_name, &bookmark, owner)?;

    if renamed {
        if let Err(e) = store.delete(current_name, owner) {
            if let Err(undo) = store.delete(&new_name, owner) {
                warn!(name = %new_name, error = %undo, "could not undo rename copy");
            }
            return Err(e.into());
        }
        info!(from = current_name, to = %new_name, "bookmark renamed");
    }
    info!(name = %new_name, "bookmark updated");

    Ok(new_name)
}

/// Resolves a name to its URL, counting the visit
pub fn resolve_bookmark(
    store: &dyn BookmarkBackend,
    owner: Option<&str>,
    name: &str,
) -> Result<String, AppError> {
    let bookmark = store.get(name, owner)?;
    let visits = store.increment_visits(name, owner)?;
    info!(name, visits, "bookmark resolved");
    Ok(bookmark.url)
}
