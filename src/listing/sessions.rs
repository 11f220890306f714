//! Per-visitor listing sessions
//!
//! Each browsing session owns one [`ListingState`]. The state sits behind its
//! own mutex, and a load-more that finds it locked is refused instead of
//! queued, so at most one fetch per session is in flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use super::ListingState;

/// Another load-more is already running for this session
#[derive(Debug, Error)]
#[error("a load is already in progress for this listing")]
pub struct SessionBusy;

/// One visitor's listing
#[derive(Debug)]
pub struct Session {
    state: Mutex<ListingState>,
}

impl Session {
    fn new(state: ListingState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Exclusive access for a load-more; fails instead of waiting
    pub fn try_begin(&self) -> Result<MutexGuard<'_, ListingState>, SessionBusy> {
        self.state.try_lock().map_err(|_| SessionBusy)
    }

    /// Start over from a fresh listing, waiting for any load in flight
    pub async fn reset(&self, state: ListingState) {
        *self.state.lock().await = state;
    }
}

struct Entry {
    session: Arc<Session>,
    last_seen: Instant,
}

/// Registry of live sessions with idle expiry and a size cap
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Register a new session and return its id
    ///
    /// Idle sessions are dropped first; when the store is still full the
    /// least recently seen session makes room.
    pub async fn create(&self, state: ListingState) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < self.ttl);
        if sessions.len() < before {
            tracing::debug!("Dropped {} idle sessions", before - sessions.len());
        }

        while sessions.len() >= self.capacity {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            tracing::debug!("Session store full, evicting {}", oldest);
            sessions.remove(&oldest);
        }

        sessions.insert(
            id.clone(),
            Entry {
                session: Arc::new(Session::new(state)),
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Look up a live session, refreshing its idle timer
    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        if entry.last_seen.elapsed() >= self.ttl {
            sessions.remove(id);
            return None;
        }
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    /// Number of sessions held, idle ones included until the next prune
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
