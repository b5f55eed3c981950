use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;

use crate::models::{ConversationSession, SessionKey};

/// Process-resident conversation state, keyed by (hotel, guest phone).
/// Sessions do not survive a restart; that is a documented limitation, not an
/// accident. Each entry carries its own async lock so that transitions for
/// one key are serialized while different conversations proceed in parallel.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<SessionKey, Arc<AsyncMutex<ConversationSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create: a missing key yields a fresh session at the start step.
    /// The returned handle must be locked before reading or mutating the
    /// session, and held for the whole read-step-write cycle.
    pub fn entry(&self, key: &SessionKey) -> Arc<AsyncMutex<ConversationSession>> {
        let mut map = self.inner.lock().unwrap();
        map.entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(ConversationSession::fresh())))
            .clone()
    }

    pub fn remove(&self, key: &SessionKey) {
        self.inner.lock().unwrap().remove(key);
    }

    /// Removes a finished conversation, but only while nobody else holds the
    /// entry. A request queued on the same key has already cloned the handle;
    /// dropping the map slot under it would strand its write in an orphaned
    /// cell. In that case the entry stays (the caller has reset it, and a
    /// fresh session is equivalent to no session).
    pub fn remove_if_idle(&self, key: &SessionKey, cell: &Arc<AsyncMutex<ConversationSession>>) {
        let mut map = self.inner.lock().unwrap();
        if let Some(current) = map.get(key) {
            // Two handles when idle: the map's and the caller's.
            if Arc::ptr_eq(current, cell) && Arc::strong_count(current) == 2 {
                map.remove(key);
            }
        }
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.inner.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions whose idle TTL has lapsed. Entries locked by an
    /// in-flight transition are skipped and caught on a later sweep.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now().naive_utc();
        let mut map = self.inner.lock().unwrap();
        let before = map.len();
        map.retain(|_, cell| match cell.try_lock() {
            Ok(session) => !session.is_expired(now),
            Err(_) => true,
        });
        before - map.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::Step;

    fn key(phone: &str) -> SessionKey {
        SessionKey {
            hotel_id: "h1".to_string(),
            phone: phone.to_string(),
        }
    }

    #[tokio::test]
    async fn entry_creates_fresh_session_at_start() {
        let store = SessionStore::new();
        assert!(!store.contains(&key("+100")));

        let cell = store.entry(&key("+100"));
        let session = cell.lock().await;
        assert_eq!(session.step, Step::Start);
        assert!(store.contains(&key("+100")));
    }

    #[tokio::test]
    async fn entry_returns_same_session_for_same_key() {
        let store = SessionStore::new();
        {
            let cell = store.entry(&key("+100"));
            cell.lock().await.step = Step::Guests;
        }
        let cell = store.entry(&key("+100"));
        assert_eq!(cell.lock().await.step, Step::Guests);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn remove_drops_the_key() {
        let store = SessionStore::new();
        store.entry(&key("+100"));
        store.remove(&key("+100"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn remove_if_idle_drops_an_unshared_entry() {
        let store = SessionStore::new();
        let cell = store.entry(&key("+100"));
        store.remove_if_idle(&key("+100"), &cell);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn remove_if_idle_keeps_an_entry_with_a_waiter() {
        let store = SessionStore::new();
        let cell = store.entry(&key("+100"));
        let waiter = store.entry(&key("+100"));

        store.remove_if_idle(&key("+100"), &cell);
        assert!(store.contains(&key("+100")));

        // The waiter's handle is still the mapped cell, so its write is seen.
        waiter.lock().await.step = Step::Guests;
        let current = store.entry(&key("+100"));
        assert_eq!(current.lock().await.step, Step::Guests);

        // Once every other handle is gone the entry can be torn down.
        drop(current);
        drop(waiter);
        store.remove_if_idle(&key("+100"), &cell);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn purge_drops_only_expired_sessions() {
        let store = SessionStore::new();
        {
            let cell = store.entry(&key("+stale"));
            cell.lock().await.expires_at = Utc::now().naive_utc() - Duration::minutes(1);
        }
        store.entry(&key("+live"));

        assert_eq!(store.purge_expired(), 1);
        assert!(!store.contains(&key("+stale")));
        assert!(store.contains(&key("+live")));
    }

    #[tokio::test]
    async fn purge_skips_locked_sessions() {
        let store = SessionStore::new();
        let cell = store.entry(&key("+busy"));
        let mut session = cell.lock().await;
        session.expires_at = Utc::now().naive_utc() - Duration::minutes(1);

        // Still held, so the sweep must leave it alone.
        assert_eq!(store.purge_expired(), 0);
        assert!(store.contains(&key("+busy")));
    }
}
