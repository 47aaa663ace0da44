//! Account storage and password hashing
//!
//! Accounts live in the `users` table of the document database when it is
//! available at startup, and in a JSON file otherwise. Unlike bookmarks there
//! is no per-call fallback: the user store is chosen once.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use redb::{Database, ReadableDatabase, ReadableTable};

use crate::database::TABLE_USERS;
use crate::error::{StoreError, StoreResult};
use crate::model::User;
use crate::storage::json_file::write_atomically;

/// Account lookup and creation, keyed by username
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::NameTaken`] when the username is in use
    fn create(&self, user: &User) -> StoreResult<()>;

    fn find_by_username(&self, username: &str) -> StoreResult<User>;
}

/// Hashes a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// False for a wrong password and for an unparsable stored hash
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

const DOCUMENT: &str = "document";

fn document_err<E: Into<redb::Error>>(err: E) -> StoreError {
    let err: redb::Error = err.into();
    StoreError::unavailable(DOCUMENT, err)
}

/// Users as JSON documents in the document database
pub struct DocumentUserStore {
    db: Arc<Database>,
}

impl DocumentUserStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl UserStore for DocumentUserStore {
    fn create(&self, user: &User) -> StoreResult<()> {
        let json = serde_json::to_string(user).map_err(|e| StoreError::unavailable(DOCUMENT, e))?;

        let write_txn = self.db.begin_write().map_err(document_err)?;
        {
            let mut table = write_txn.open_table(TABLE_USERS).map_err(document_err)?;
            if table
                .get(user.username.as_str())
                .map_err(document_err)?
                .is_some()
            {
                return Err(StoreError::NameTaken);
            }
            table
                .insert(user.username.as_str(), json.as_str())
                .map_err(document_err)?;
        }
        write_txn.commit().map_err(document_err)?;

        Ok(())
    }

    fn find_by_username(&self, username: &str) -> StoreResult<User> {
        let read_txn = self.db.begin_read().map_err(document_err)?;
        let table = read_txn.open_table(TABLE_USERS).map_err(document_err)?;

        let raw = table
            .get(username)
            .map_err(document_err)?
            .map(|guard| guard.value().to_string())
            .ok_or(StoreError::NotFound)?;

        serde_json::from_str(&raw).map_err(|e| StoreError::unavailable(DOCUMENT, e))
    }
}

const USERS_FILE: &str = "users file";

/// Users as a `username -> User` mapping in a JSON file
///
/// Written the same way as the bookmark file: whole file, temp file + rename.
pub struct JsonUserStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> StoreResult<BTreeMap<String, User>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|e| StoreError::unavailable(USERS_FILE, e))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StoreError::unavailable(USERS_FILE, e)),
        }
    }
}

impl UserStore for JsonUserStore {
    fn create(&self, user: &User) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut users = self.load()?;

        if users.contains_key(&user.username) {
            return Err(StoreError::NameTaken);
        }
        users.insert(user.username.clone(), user.clone());

        let json = serde_json::to_string_pretty(&users)
            .map_err(|e| StoreError::unavailable(USERS_FILE, e))?;
        write_atomically(&self.path, &json).map_err(|e| StoreError::unavailable(USERS_FILE, e))
    }

    fn find_by_username(&self, username: &str) -> StoreResult<User> {
        self.load()?.remove(username).ok_or(StoreError::NotFound)
    }
}
