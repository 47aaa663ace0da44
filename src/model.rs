//! Data models for the bookmarking service
//!
//! This module defines the persisted records (bookmarks and users) and the
//! form payloads accepted by the route handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attribute record of a bookmark
///
/// The bookmark's name is not part of the record: every backend keys records by
/// name, and listings are returned as a `name -> Bookmark` mapping.
///
/// Example (as stored in the JSON fallback file):
/// ```json
/// {
///   "docs": {
///     "url": "http://example.com/docs",
///     "notes": "",
///     "date_added": "2026-01-17T13:40:00Z",
///     "visits": 2,
///     "owner": "0b0d6c1e-..."
///   }
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Bookmark {
    /// Target URL, always carrying an explicit `http://` or `https://` scheme
    pub url: String,

    #[serde(default)]
    pub notes: String,

    /// Set once at creation; records without one read as the Unix epoch
    #[serde(default = "timestamp::epoch", deserialize_with = "timestamp::deserialize")]
    pub date_added: DateTime<Utc>,

    /// Refreshed on every edit; absent until the first one
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_modified: Option<DateTime<Utc>>,

    /// Number of successful resolutions
    #[serde(default)]
    pub visits: u64,

    /// Id of the creating user; absent means the unscoped namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Bookmark {
    /// A fresh bookmark with no visits, stamped with the current time
    pub fn new(url: String, notes: String, owner: Option<&str>) -> Self {
        Self {
            url,
            notes,
            date_added: Utc::now(),
            date_modified: None,
            visits: 0,
            owner: owner.map(str::to_string),
        }
    }
}

/// Timestamp decoding shared by both bookmark backends
///
/// Timestamps are written as RFC 3339. Files and documents from earlier
/// releases carry `YYYY-MM-DD HH:MM:SS` without an offset; those are read as
/// UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, LEGACY_FORMAT)
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    /// `null` and the empty string both read as no timestamp
    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw))),
        }
    }
}

/// A registered account
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,

    /// Salted argon2 hash in PHC string format
    pub password_hash: String,

    pub date_joined: DateTime<Utc>,
}

/// Form body of `POST /add` and `POST /edit/{name}`
#[derive(Deserialize, Debug, Clone)]
pub struct BookmarkForm {
    pub custom_name: String,
    pub url: String,
    #[serde(default)]
    pub notes: String,
}

/// Query string of `GET /search`
#[derive(Deserialize, Debug)]
pub struct SearchParams {
    pub search: Option<String>,
}

/// Form body of `POST /login`
#[derive(Deserialize, Debug)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Return path carried over from the login redirect
    #[serde(default)]
    pub next: Option<String>,
}

/// Form body of `POST /signup`
#[derive(Deserialize, Debug)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Query string of `GET /login`
#[derive(Deserialize, Debug)]
pub struct LoginParams {
    pub next: Option<String>,
}
