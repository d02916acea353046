//! In-memory session store with per-session mutual exclusion.
//!
//! Every session id maps to a slot: an `Arc<Mutex<Option<ReviewContext>>>`.
//! A review round checks the slot out for its whole duration, so two rounds
//! on the same session run one after the other while rounds on different
//! sessions proceed in parallel. The outer map lock is held only long enough
//! to find or create a slot, never across an evaluator call.
//!
//! The store is bounded: once `max_sessions` slots exist, creating another
//! evicts the least recently checked-out slot that nobody is using.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::domain::models::{ReviewContext, SessionStoreConfig};

type Slot = Arc<Mutex<Option<ReviewContext>>>;

struct SlotEntry {
    slot: Slot,
    last_touched: u64,
}

impl SlotEntry {
    /// Only the map itself references the slot.
    fn is_idle(&self) -> bool {
        Arc::strong_count(&self.slot) == 1
    }
}

#[derive(Default)]
struct Inner {
    slots: HashMap<String, SlotEntry>,
    clock: u64,
}

/// Exclusive access to one session's stored context.
///
/// Obtained from [`SessionStore::checkout`] and handed back with
/// [`SessionStore::release`]. Dropping it without releasing is safe; the
/// slot just lingers until it is reused or evicted.
pub struct SessionGuard {
    session_id: String,
    guard: OwnedMutexGuard<Option<ReviewContext>>,
}

impl SessionGuard {
    /// Store `context` in the slot, replacing whatever was there.
    pub fn put(&mut self, context: ReviewContext) {
        *self.guard = Some(context);
    }

    pub fn context(&self) -> Option<&ReviewContext> {
        self.guard.as_ref()
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("session_id", &self.session_id)
            .field("occupied", &self.guard.is_some())
            .finish()
    }
}

/// Concurrency-safe map from session id to review context.
pub struct SessionStore {
    inner: Mutex<Inner>,
    max_sessions: usize,
}

impl SessionStore {
    /// Create a store holding at most `max_sessions` sessions (0 = unbounded).
    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_sessions,
        }
    }

    pub fn from_config(config: &SessionStoreConfig) -> Self {
        Self::with_capacity(config.max_sessions)
    }

    /// Wait for exclusive access to a session's slot, creating it if needed.
    pub async fn checkout(&self, session_id: &str) -> SessionGuard {
        let slot = {
            let mut inner = self.inner.lock().await;
            inner.clock += 1;
            let now = inner.clock;

            if !inner.slots.contains_key(session_id) {
                self.make_room(&mut inner);
                inner.slots.insert(
                    session_id.to_string(),
                    SlotEntry {
                        slot: Arc::new(Mutex::new(None)),
                        last_touched: now,
                    },
                );
            }

            match inner.slots.get_mut(session_id) {
                Some(entry) => {
                    entry.last_touched = now;
                    Arc::clone(&entry.slot)
                }
                None => Arc::new(Mutex::new(None)),
            }
        };

        SessionGuard {
            session_id: session_id.to_string(),
            guard: slot.lock_owned().await,
        }
    }

    /// Hand a checked-out slot back. Empty slots nobody else is waiting on
    /// are dropped from the map.
    pub async fn release(&self, guard: SessionGuard) {
        let SessionGuard { session_id, guard } = guard;
        drop(guard);

        let mut inner = self.inner.lock().await;
        let removable = inner.slots.get(&session_id).is_some_and(|entry| {
            entry.is_idle()
                && entry
                    .slot
                    .try_lock()
                    .map(|stored| stored.is_none())
                    .unwrap_or(false)
        });
        if removable {
            inner.slots.remove(&session_id);
        }
    }

    /// Snapshot of a stored context. Waits for any in-flight round on the
    /// session to finish.
    pub async fn load(&self, session_id: &str) -> Option<ReviewContext> {
        let slot = {
            let inner = self.inner.lock().await;
            inner
                .slots
                .get(session_id)
                .map(|entry| Arc::clone(&entry.slot))
        }?;
        let stored = slot.lock().await;
        (*stored).clone()
    }

    /// Store a context under its own session id.
    ///
    /// Contexts without a non-empty session id are not stored and `false`
    /// is returned.
    pub async fn store(&self, context: ReviewContext) -> bool {
        let Some(session_id) = context.session_key().map(str::to_string) else {
            return false;
        };

        let mut guard = self.checkout(&session_id).await;
        guard.put(context);
        self.release(guard).await;
        true
    }

    /// Forget a session, returning whatever was stored for it.
    pub async fn remove(&self, session_id: &str) -> Option<ReviewContext> {
        let entry = self.inner.lock().await.slots.remove(session_id)?;
        let mut stored = entry.slot.lock().await;
        stored.take()
    }

    /// Number of tracked sessions, including ones currently checked out.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn make_room(&self, inner: &mut Inner) {
        if self.max_sessions == 0 || inner.slots.len() < self.max_sessions {
            return;
        }

        let victim = inner
            .slots
            .iter()
            .filter(|(_, entry)| entry.is_idle())
            .min_by_key(|(_, entry)| entry.last_touched)
            .map(|(id, _)| id.clone());

        match victim {
            Some(id) => {
                inner.slots.remove(&id);
                debug!(session_id = %id, "evicted least recently used session");
            }
            None => warn!(
                max_sessions = self.max_sessions,
                "all sessions busy; exceeding session store capacity"
            ),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config(&SessionStoreConfig::default())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("max_sessions", &self.max_sessions)
            .finish_non_exhaustive()
    }
}
