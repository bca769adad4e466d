//! Cookie-keyed session storage
//!
//! Sessions live in memory, keyed by a random UUID carried in the
//! `appkit_session` cookie. A session is only stored once something writes
//! to it (a locale preference, a flash message, a signed-in user); requests
//! that never write leave the store untouched and get no cookie.
//!
//! Entries idle for longer than the store's TTL are dropped, lazily on
//! access and in bulk by [`spawn_purge_task`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::AppState;

pub const SESSION_COOKIE: &str = "appkit_session";

/// Sessions untouched for this long are discarded
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// One-shot messages shown on the next page view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Flash {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

impl Flash {
    pub fn is_empty(&self) -> bool {
        self.notice.is_none() && self.alert.is_none()
    }
}

/// Data persisted across requests of one client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub locale: Option<String>,
    pub user: Option<CurrentUser>,
    pub flash: Flash,
}

#[derive(Debug)]
struct Entry {
    data: SessionData,
    last_seen: Instant,
}

impl Entry {
    fn expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() >= ttl
    }
}

/// Shared in-memory session store with idle expiry
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_IDLE_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    /// Store `data` under a new id
    pub async fn insert(&self, data: SessionData) -> Uuid {
        let id = Uuid::new_v4();
        let entry = Entry {
            data,
            last_seen: Instant::now(),
        };
        self.sessions.write().await.insert(id, entry);
        id
    }

    /// Mark the session as used; false if unknown or expired
    pub async fn touch(&self, id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        let expired = match sessions.get_mut(&id) {
            Some(entry) if !entry.expired(self.idle_ttl) => {
                entry.last_seen = Instant::now();
                return true;
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            sessions.remove(&id);
            debug!("Session {} expired", id);
        }
        false
    }

    pub async fn load(&self, id: Uuid) -> Option<SessionData> {
        self.sessions
            .read()
            .await
            .get(&id)
            .filter(|entry| !entry.expired(self.idle_ttl))
            .map(|entry| entry.data.clone())
    }

    /// Apply `f` to the session, returning its result; `None` if unknown
    /// or expired
    pub async fn update<F, R>(&self, id: Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&mut SessionData) -> R,
    {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .filter(|entry| !entry.expired(self.idle_ttl))?;
        entry.last_seen = Instant::now();
        Some(f(&mut entry.data))
    }

    /// Apply `f` to the live session `id`, or to a fresh session stored
    /// under a new id when `id` is absent, unknown or expired
    async fn upsert<F, R>(&self, id: Option<Uuid>, f: F) -> (Uuid, R)
    where
        F: FnOnce(&mut SessionData) -> R,
    {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        if let Some(current) = id {
            if let Some(entry) = sessions
                .get_mut(&current)
                .filter(|entry| !entry.expired(self.idle_ttl))
            {
                entry.last_seen = now;
                return (current, f(&mut entry.data));
            }
        }

        let mut data = SessionData::default();
        let result = f(&mut data);
        let fresh = Uuid::new_v4();
        sessions.insert(
            fresh,
            Entry {
                data,
                last_seen: now,
            },
        );
        (fresh, result)
    }

    /// Drop every expired session, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.expired(self.idle_ttl));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Periodically purge expired sessions until the runtime shuts down
pub fn spawn_purge_task(store: SessionStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let removed = store.purge_expired().await;
            if removed > 0 {
                info!("Purged {} expired session(s)", removed);
            }
        }
    })
}

/// Handle to the current request's session, available as an extension
///
/// Holds no id until the session exists in the store; the first write
/// creates it.
#[derive(Debug, Clone)]
pub struct Session {
    id: Arc<Mutex<Option<Uuid>>>,
    store: SessionStore,
}

impl Session {
    fn new(id: Option<Uuid>, store: SessionStore) -> Self {
        Self {
            id: Arc::new(Mutex::new(id)),
            store,
        }
    }

    /// Id of the stored session, `None` while nothing has been written
    pub async fn id(&self) -> Option<Uuid> {
        *self.id.lock().await
    }

    /// Snapshot of the session data
    pub async fn get(&self) -> SessionData {
        match self.id().await {
            Some(id) => self.store.load(id).await.unwrap_or_default(),
            None => SessionData::default(),
        }
    }

    /// Apply `f` to the session data, storing the session if needed
    pub async fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SessionData) -> R,
    {
        let mut id = self.id.lock().await;
        let (stored, result) = self.store.upsert(*id, f).await;
        if *id != Some(stored) {
            debug!("Stored new session {}", stored);
            *id = Some(stored);
        }
        result
    }

    /// Remove and return pending flash messages
    pub async fn take_flash(&self) -> Flash {
        match self.id().await {
            Some(id) => self
                .store
                .update(id, |data| std::mem::take(&mut data.flash))
                .await
                .unwrap_or_default(),
            None => Flash::default(),
        }
    }
}

/// Session id from the request's cookies, if well-formed
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Attach the client's session, if any, and issue a cookie when a new one
/// gets stored while handling the request
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = match session_id_from_headers(request.headers()) {
        Some(id) => {
            if state.sessions.touch(id).await {
                Some(id)
            } else {
                debug!("Unknown or expired session {}", id);
                None
            }
        }
        None => None,
    };

    let session = Session::new(existing, state.sessions.clone());
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    let stored = session.id().await;
    if let Some(id) = stored.filter(|id| Some(*id) != existing) {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("Failed to encode session cookie: {}", e),
        }
    }

    response
}
