//! Session storage and expiry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::Instant;

use super::{Session, SessionId, Tags};
use crate::error::PagerError;
use crate::Result;

/// Default session lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Longest lifetime a session may be given.
pub const MAX_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Policy applied to every session the store creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Time from creation until a session expires.
    pub ttl: Duration,
    /// Records per page.
    pub page_size: usize,
}

impl StoreConfig {
    /// Build a config, clamping `ttl` into `1ms..=MAX_TTL` and `page_size`
    /// to at least one.
    pub fn new(ttl: Duration, page_size: usize) -> Self {
        Self {
            ttl: ttl.clamp(Duration::from_millis(1), MAX_TTL),
            page_size: page_size.max(1),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_PAGE_SIZE)
    }
}

/// Thread-safe registry of live sessions.
///
/// Lookups share a read lock. Inserts and removals take the write lock
/// only for the structural change itself.
///
/// [`get`](Self::get) does not compare the deadline against the clock: an
/// expired session stays reachable until the next [`prune`](Self::prune),
/// so the staleness window is bounded by the prune interval.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
    config: StoreConfig,
}

impl SessionStore {
    /// Create a new empty store with the default policy.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    /// Create and register a new session.
    ///
    /// Fails only with [`PagerError::StoreFault`] if the registry lock is
    /// poisoned.
    pub fn create(&self, tags: Tags) -> Result<Arc<Session>> {
        let mut sessions = self.write()?;

        let mut id = SessionId::new();
        while sessions.contains_key(&id) {
            tracing::error!(session_id = %id, "random session id collided, regenerating");
            id = SessionId::new();
        }

        let session = Arc::new(Session::new(
            id,
            tags,
            self.config.ttl,
            self.config.page_size,
        ));
        sessions.insert(id, Arc::clone(&session));
        drop(sessions);

        tracing::debug!(
            session_id = %id,
            tags = session.tags().len(),
            deadline = %session.deadline(),
            "session created"
        );
        Ok(session)
    }

    /// Look up a session by ID.
    pub fn get(&self, id: &SessionId) -> Result<Arc<Session>> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| PagerError::NotFound(id.to_string()))
    }

    /// Check if a session is registered.
    pub fn contains(&self, id: &SessionId) -> Result<bool> {
        Ok(self.read()?.contains_key(id))
    }

    /// Get the number of sessions in the store.
    ///
    /// A poisoned registry reads as empty and is logged.
    pub fn len(&self) -> usize {
        self.read().map(|s| s.len()).unwrap_or_else(|e| {
            tracing::error!(error = %e, "reporting session store as empty");
            0
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List all session IDs.
    pub fn ids(&self) -> Result<Vec<SessionId>> {
        Ok(self.read()?.keys().copied().collect())
    }

    /// Remove every session whose deadline has passed.
    ///
    /// Returns the number of sessions removed.
    pub fn prune(&self) -> Result<usize> {
        self.prune_at(Instant::now())
    }

    /// Remove every session that is expired as of `now`.
    ///
    /// Expired IDs are collected under the shared lock, so lookups proceed
    /// while the scan runs. The exclusive lock is held only to remove them,
    /// and each candidate's deadline is checked again before removal.
    pub fn prune_at(&self, now: Instant) -> Result<usize> {
        let expired: Vec<SessionId> = self
            .read()?
            .values()
            .filter(|s| s.is_expired_at(now))
            .map(|s| s.id())
            .collect();

        if expired.is_empty() {
            return Ok(0);
        }

        let mut sessions = self.write()?;
        let removed = remove_expired(&mut sessions, &expired, now);
        let remaining = sessions.len();
        drop(sessions);

        tracing::debug!(removed, remaining, "pruned expired sessions");
        Ok(removed)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<SessionId, Arc<Session>>>> {
        self.sessions
            .read()
            .map_err(|_| PagerError::StoreFault("session registry lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<SessionId, Arc<Session>>>> {
        self.sessions
            .write()
            .map_err(|_| PagerError::StoreFault("session registry lock poisoned".into()))
    }

    /// Poison the registry lock by panicking while holding it.
    #[cfg(test)]
    pub(crate) fn poison(self: &Arc<Self>) {
        let store = Arc::clone(self);
        let _ = std::thread::spawn(move || {
            let _guard = store.sessions.write();
            panic!("writer died holding the session registry");
        })
        .join();
    }
}

fn remove_expired(
    sessions: &mut HashMap<SessionId, Arc<Session>>,
    candidates: &[SessionId],
    now: Instant,
) -> usize {
    let mut removed = 0;
    for id in candidates {
        if sessions.get(id).is_some_and(|s| s.is_expired_at(now)) {
            sessions.remove(id);
            removed += 1;
        }
    }
    removed
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Record;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        Tags::try_from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_create_session() {
        let store = SessionStore::new();
        let session = store.create(Tags::empty()).unwrap();

        assert!(store.contains(&session.id()).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(session.page(), 0);
    }

    #[test]
    fn test_get_session() {
        let store = SessionStore::new();
        let created = store.create(tags(&[("task", "cpu")])).unwrap();

        let session = store.get(&created.id()).unwrap();
        assert_eq!(session.id(), created.id());
        assert_eq!(session.tags().get("task"), Some("cpu"));
    }

    #[test]
    fn test_get_nonexistent() {
        let store = SessionStore::new();
        let err = store.get(&SessionId::new()).unwrap_err();
        assert!(matches!(err, PagerError::NotFound(_)));
    }

    #[test]
    fn test_producer_writes_visible_through_lookup() {
        let store = SessionStore::with_config(StoreConfig::new(Duration::from_secs(60), 2));
        let created = store.create(Tags::empty()).unwrap();
        created.extend(["a", "b", "c"]).unwrap();

        let session = store.get(&created.id()).unwrap();
        assert_eq!(session.page(), 1);
        assert!(matches!(
            session.get_page(1),
            Err(PagerError::OutOfRange { page: 1, .. })
        ));

        created.finish().unwrap();
        assert_eq!(session.page(), 2);
        assert_eq!(session.get_page(1).unwrap(), vec![Record::from("c")]);
    }

    #[test]
    fn test_ttl_from_config() {
        let store = SessionStore::with_config(StoreConfig::new(Duration::from_secs(30), 10));
        let session = store.create(Tags::empty()).unwrap();
        let lifetime = session.deadline() - session.created_at();
        assert_eq!(lifetime.num_seconds(), 30);
    }

    #[test]
    fn test_prune_removes_only_expired() {
        let store = SessionStore::with_config(StoreConfig::new(Duration::from_secs(10), 10));
        let first = store.create(Tags::empty()).unwrap();
        let second = store.create(Tags::empty()).unwrap();

        // Nothing is expired yet.
        assert_eq!(store.prune().unwrap(), 0);
        assert_eq!(store.len(), 2);

        // Just before the earlier deadline both survive.
        let now = first.expires_at() - Duration::from_millis(1);
        assert_eq!(store.prune_at(now).unwrap(), 0);

        // At the later deadline both are gone.
        let later = first.expires_at().max(second.expires_at());
        assert_eq!(store.prune_at(later).unwrap(), 2);
        assert!(store.is_empty());
        assert!(matches!(
            store.get(&first.id()),
            Err(PagerError::NotFound(_))
        ));
    }

    #[test]
    fn test_expired_session_reachable_until_pruned() {
        let store = SessionStore::with_config(StoreConfig::new(Duration::from_millis(1), 10));
        let session = store.create(Tags::empty()).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        // Lookup does not re-check the deadline.
        assert!(store.get(&session.id()).is_ok());

        assert_eq!(store.prune().unwrap(), 1);
        assert!(store.get(&session.id()).is_err());
    }

    #[test]
    fn test_removal_rechecks_deadline() {
        let store = SessionStore::with_config(StoreConfig::new(Duration::from_secs(60), 10));
        let live = store.create(Tags::empty()).unwrap();
        let stale = Session::new(SessionId::new(), Tags::empty(), Duration::from_millis(1), 10);
        let now = stale.expires_at();

        let mut sessions = store.write().unwrap();
        sessions.insert(stale.id(), Arc::new(stale));
        let candidates: Vec<SessionId> = sessions.keys().copied().collect();

        assert_eq!(remove_expired(&mut sessions, &candidates, now), 1);
        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains_key(&live.id()));
    }

    #[test]
    fn test_poisoned_registry_reported() {
        let store = Arc::new(SessionStore::new());
        let id = store.create(Tags::empty()).unwrap().id();
        store.poison();

        assert_eq!(store.len(), 0);
        assert!(matches!(store.get(&id), Err(PagerError::StoreFault(_))));
        assert!(matches!(store.prune(), Err(PagerError::StoreFault(_))));
        assert!(matches!(
            store.create(Tags::empty()),
            Err(PagerError::StoreFault(_))
        ));
    }

    #[test]
    fn test_config_clamped() {
        let config = StoreConfig::new(Duration::ZERO, 0);
        assert_eq!(config.page_size, 1);
        assert!(config.ttl > Duration::ZERO);

        let config = StoreConfig::new(Duration::from_secs(u64::MAX), 5);
        assert_eq!(config.ttl, MAX_TTL);
    }

    #[test]
    fn test_list_ids() {
        let store = SessionStore::new();
        let id1 = store.create(Tags::empty()).unwrap().id();
        let id2 = store.create(Tags::empty()).unwrap().id();
        let id3 = store.create(Tags::empty()).unwrap().id();

        let ids = store.ids().unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&id1));
        assert!(ids.contains(&id2));
        assert!(ids.contains(&id3));
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let store = Arc::new(SessionStore::new());
        let mut handles = vec![];

        for _ in 0..100 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store.create(Tags::empty()).unwrap().id()
            }));
        }

        let ids: Vec<SessionId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 100);
        assert_eq!(store.len(), 100);
    }
}
