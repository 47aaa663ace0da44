//! Server-side sessions and flash messages
//!
//! A visitor gets a random session id in the `session` cookie once there is
//! something to remember: a login or a flash message. The registry maps that
//! id to the logged-in user (if any) and to the flash messages waiting for the
//! next rendered page.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::Response,
};
use rand::{distr::Alphanumeric, Rng};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

const SESSION_ID_LEN: usize = 32;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }
}

/// One-shot message shown on the next rendered page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
}

/// The session attached to the current request by
/// [`crate::middleware::load_session`]
#[derive(Clone, Debug)]
pub struct CurrentSession {
    pub id: String,
    pub user: Option<SessionUser>,
}

impl CurrentSession {
    /// Storage scope key for this visitor's bookmarks
    pub fn owner(&self) -> Option<String> {
        self.user.as_ref().map(|user| user.id.to_string())
    }
}

struct SessionData {
    user: Option<SessionUser>,
    flashes: Vec<Flash>,
    last_seen: Instant,
}

impl SessionData {
    fn new() -> Self {
        Self {
            user: None,
            flashes: Vec::new(),
            last_seen: Instant::now(),
        }
    }
}

fn new_session_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// In-process session registry
///
/// Entries are created lazily: a visitor that never logs in and never gets
/// a flash message leaves nothing behind. Entries idle for longer than the
/// timeout are dropped.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionData>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    fn is_live(&self, data: &SessionData, now: Instant) -> bool {
        now.duration_since(data.last_seen) < self.idle_timeout
    }

    fn purge_expired(&self, sessions: &mut HashMap<String, SessionData>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, data| self.is_live(data, now));
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "expired sessions removed");
        }
    }

    /// Returns the live session for `id`, or an unregistered one with a fresh
    /// id when `id` is missing, unknown or expired. The flag is true for a
    /// fresh id; it only becomes a stored session once something is written
    /// to it.
    pub async fn resolve(&self, id: Option<&str>) -> (CurrentSession, bool) {
        if let Some(id) = id {
            let now = Instant::now();
            let mut sessions = self.inner.write().await;
            let live_user = match sessions.get_mut(id) {
                Some(data) if self.is_live(data, now) => {
                    data.last_seen = now;
                    Some(data.user.clone())
                }
                _ => None,
            };

            match live_user {
                Some(user) => {
                    return (
                        CurrentSession {
                            id: id.to_string(),
                            user,
                        },
                        false,
                    )
                }
                None => {
                    sessions.remove(id);
                }
            }
        }

        (
            CurrentSession {
                id: new_session_id(),
                user: None,
            },
            true,
        )
    }

    /// Whether `id` names a stored session
    pub async fn contains(&self, id: &str) -> bool {
        self.inner.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Attaches `user` under a new session id and retires `id`
    ///
    /// Pending flash messages move to the new session. Returns the new id,
    /// which the caller must hand to the client.
    pub async fn login(&self, id: &str, user: SessionUser) -> String {
        let now = Instant::now();
        let mut sessions = self.inner.write().await;
        self.purge_expired(&mut sessions, now);

        let mut data = sessions.remove(id).unwrap_or_else(SessionData::new);
        data.user = Some(user);
        data.last_seen = now;

        let new_id = new_session_id();
        sessions.insert(new_id.clone(), data);
        new_id
    }

    /// Forgets the session entirely
    pub async fn logout(&self, id: &str) {
        self.inner.write().await.remove(id);
    }

    pub async fn flash(&self, id: &str, flash: Flash) {
        let now = Instant::now();
        let mut sessions = self.inner.write().await;
        if !sessions.contains_key(id) {
            self.purge_expired(&mut sessions, now);
        }

        let data = sessions.entry(id.to_string()).or_insert_with(SessionData::new);
        data.last_seen = now;
        data.flashes.push(flash);
    }

    /// Drains the pending flash messages
    pub async fn take_flashes(&self, id: &str) -> Vec<Flash> {
        self.inner
            .write()
            .await
            .get_mut(id)
            .map(|data| std::mem::take(&mut data.flashes))
            .unwrap_or_default()
    }
}

/// Session id from the `Cookie` header, if present
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
}

/// `Set-Cookie` value for a session id
pub fn session_cookie_header(id: &str) -> String {
    format!("{}={}; HttpOnly; SameSite=Lax; Path=/", SESSION_COOKIE, id)
}

/// Hands session `id` to the client
pub fn set_session_cookie(response: &mut Response, id: &str) {
    match HeaderValue::from_str(&session_cookie_header(id)) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "session cookie is not a valid header value"),
    }
}
