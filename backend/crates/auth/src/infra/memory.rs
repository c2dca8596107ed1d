//! In-Memory Store Implementations
//!
//! Process-local stores for tests and single-node embedding.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::domain::entity::user::UserRecord;
use crate::domain::repository::{SessionStore, UserPredicate, UserProperty, UserStore};
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthResult;

// ============================================================================
// User Store
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record with the same id
    pub fn insert(&self, user: UserRecord) -> Option<UserRecord> {
        self.users.write().insert(user.id, user)
    }

    pub fn remove(&self, user_id: &UserId) -> Option<UserRecord> {
        self.users.write().remove(user_id)
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn find(&self, predicate: impl Fn(&UserRecord) -> bool) -> Option<UserRecord> {
        self.users.read().values().find(|u| predicate(u)).cloned()
    }
}

impl UserStore for InMemoryUserStore {
    async fn find_by_property(
        &self,
        property: UserProperty,
        value: &str,
    ) -> AuthResult<Option<UserRecord>> {
        Ok(self.find(|u| property.value_of(u) == value))
    }

    async fn find_by_predicate(
        &self,
        predicate: &UserPredicate,
    ) -> AuthResult<Option<UserRecord>> {
        Ok(self.find(|u| predicate.matches(u)))
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<UserRecord>> {
        Ok(self.users.read().get(user_id).cloned())
    }
}

// ============================================================================
// Session Store
// ============================================================================

#[derive(Debug)]
struct StoredPayload {
    bytes: Vec<u8>,
    expires_at: Instant,
}

impl StoredPayload {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Session payloads with per-entry TTL. Expired entries read as absent and
/// are dropped on the next write.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, StoredPayload>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .values()
            .filter(|p| p.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> AuthResult<Option<Vec<u8>>> {
        let now = Instant::now();
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .filter(|p| p.is_live(now))
            .map(|p| p.bytes.clone()))
    }

    async fn put(&self, session_id: &str, payload: Vec<u8>, ttl: Duration) -> AuthResult<()> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or(now + Duration::from_secs(86400 * 365));

        let mut sessions = self.sessions.write();
        sessions.retain(|_, p| p.is_live(now));
        sessions.insert(
            session_id.to_string(),
            StoredPayload {
                bytes: payload,
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> AuthResult<()> {
        self.sessions.write().remove(session_id);
        Ok(())
    }
}
