//! Session Identity Manager
//!
//! Keeps the identity stored in a session in step with the user store.
//! Every request re-fetches the user by id, re-runs the status gate and
//! compares the fresh record against the token's snapshot before trusting it.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::entity::identity_token::IdentityToken;
use crate::domain::entity::user::UserRecord;
use crate::domain::equality::{EqualityStrategy, FieldEquality};
use crate::domain::repository::{SessionStore, UserStore};
use crate::domain::status_gate::StatusViolation;
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Session State
// ============================================================================

/// Why a session was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// Token refers to a user the store no longer has
    UserVanished,
    /// Fresh record failed the status gate
    AccountStatus(StatusViolation),
    /// Fresh record no longer matches the token's snapshot
    DriftDetected,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserVanished => f.write_str("user_vanished"),
            Self::AccountStatus(violation) => write!(f, "account_status:{}", violation.code()),
            Self::DriftDetected => f.write_str("drift_detected"),
        }
    }
}

impl From<RejectionReason> for AuthError {
    fn from(reason: RejectionReason) -> Self {
        match reason {
            RejectionReason::UserVanished => AuthError::UserVanished,
            RejectionReason::AccountStatus(violation) => violation.into(),
            RejectionReason::DriftDetected => AuthError::DriftDetected,
        }
    }
}

/// Outcome of resolving a session.
///
/// `Rejected` must be treated as `Anonymous` for authorization; the caller
/// should also clear its session identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(UserRecord),
    Rejected(RejectionReason),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn into_user(self) -> Option<UserRecord> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

// ============================================================================
// Manager
// ============================================================================

pub struct SessionIdentityManager<U, S>
where
    U: UserStore,
    S: SessionStore,
{
    user_store: Arc<U>,
    session_store: Arc<S>,
    strategy: Arc<dyn EqualityStrategy>,
    config: Arc<AuthConfig>,
}

impl<U, S> SessionIdentityManager<U, S>
where
    U: UserStore,
    S: SessionStore,
{
    /// Manager using [`FieldEquality`] for the drift check
    pub fn new(user_store: Arc<U>, session_store: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self::with_strategy(user_store, session_store, Arc::new(FieldEquality), config)
    }

    pub fn with_strategy(
        user_store: Arc<U>,
        session_store: Arc<S>,
        strategy: Arc<dyn EqualityStrategy>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_store,
            session_store,
            strategy,
            config,
        }
    }

    /// Store a token for a freshly authenticated user
    pub async fn establish_session(&self, session_id: &str, user: &UserRecord) -> AuthResult<()> {
        self.store_token(session_id, user).await?;

        tracing::info!(
            user_id = %user.id,
            session_id = %session_id,
            "Session established"
        );

        Ok(())
    }

    /// Resolve the identity behind `session_id` for the current request.
    ///
    /// Only store failures surface as errors. A token that is missing,
    /// unreadable or stale yields `Anonymous` or `Rejected`, deleting the
    /// stored payload where one existed.
    pub async fn resolve_session(&self, session_id: &str) -> AuthResult<SessionState> {
        let Some(payload) = self.session_store.get(session_id).await? else {
            return Ok(SessionState::Anonymous);
        };

        let token = match IdentityToken::decode(&payload, &self.config.token_secret) {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "Discarding malformed session token");
                self.session_store.delete(session_id).await?;
                return Ok(SessionState::Anonymous);
            }
        };

        if token.is_expired(self.config.session_ttl, now_ms()) {
            tracing::debug!(session_id = %session_id, user_id = %token.user_id, "Session idle timeout");
            self.session_store.delete(session_id).await?;
            return Ok(SessionState::Anonymous);
        }

        let Some(user) = self.user_store.find_by_id(&token.user_id).await? else {
            return self
                .reject(session_id, &token, RejectionReason::UserVanished)
                .await;
        };

        if let Err(violation) = user.check_status() {
            return self
                .reject(session_id, &token, RejectionReason::AccountStatus(violation))
                .await;
        }

        if !token.matches(&user, self.strategy.as_ref()) {
            return self
                .reject(session_id, &token, RejectionReason::DriftDetected)
                .await;
        }

        // Writes that landed while this request was validating win: a logout
        // is never undone, a newer token is never overwritten
        match self.session_store.get(session_id).await? {
            None => {
                tracing::debug!(
                    session_id = %session_id,
                    user_id = %user.id,
                    "Session invalidated during resolve"
                );
                return Ok(SessionState::Anonymous);
            }
            Some(current) if current != payload => {}
            // Re-derive from the fresh record so the stored snapshot never
            // lags behind what this request validated
            Some(_) => self.store_token(session_id, &user).await?,
        }

        Ok(SessionState::Authenticated(user))
    }

    /// Destroy the stored token. Unknown session ids are not an error.
    pub async fn invalidate_session(&self, session_id: &str) -> AuthResult<()> {
        self.session_store.delete(session_id).await?;

        tracing::info!(session_id = %session_id, "Session invalidated");

        Ok(())
    }

    async fn store_token(&self, session_id: &str, user: &UserRecord) -> AuthResult<()> {
        let token = IdentityToken::mint(user, self.strategy.as_ref(), now_ms())
            .map_err(|e| AuthError::Internal(format!("Identity snapshot failed: {e}")))?;
        let payload = token
            .encode(&self.config.token_secret)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {e}")))?;

        self.session_store
            .put(session_id, payload, self.config.session_ttl)
            .await
    }

    async fn reject(
        &self,
        session_id: &str,
        token: &IdentityToken,
        reason: RejectionReason,
    ) -> AuthResult<SessionState> {
        tracing::warn!(
            session_id = %session_id,
            user_id = %token.user_id,
            reason = %reason,
            "Session rejected"
        );

        self.session_store.delete(session_id).await?;

        Ok(SessionState::Rejected(reason))
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::repository::{UserPredicate, UserProperty};
    use crate::domain::value_object::{user_id::UserId, user_status::StatusFlags};
    use crate::infra::memory::{InMemorySessionStore, InMemoryUserStore};

    struct Fixture {
        users: Arc<InMemoryUserStore>,
        sessions: Arc<InMemorySessionStore>,
        manager: SessionIdentityManager<InMemoryUserStore, InMemorySessionStore>,
        user: UserRecord,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserStore::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let config = Arc::new(AuthConfig::with_random_secret());
        let manager =
            SessionIdentityManager::new(Arc::clone(&users), Arc::clone(&sessions), config);

        let user = UserRecord::new(UserId::new(), "bob", "bob@example.com", "stored-hash");
        users.insert(user.clone());

        Fixture {
            users,
            sessions,
            manager,
            user,
        }
    }

    #[tokio::test]
    async fn test_establish_then_resolve() {
        let f = fixture();
        f.manager.establish_session("s1", &f.user).await.unwrap();

        let state = f.manager.resolve_session("s1").await.unwrap();
        assert_eq!(state, SessionState::Authenticated(f.user.clone()));
        assert!(state.is_authenticated());
    }

    #[tokio::test]
    async fn test_unknown_session_is_anonymous() {
        let f = fixture();
        assert_eq!(
            f.manager.resolve_session("nope").await.unwrap(),
            SessionState::Anonymous
        );
    }

    #[tokio::test]
    async fn test_garbage_payload_is_anonymous_and_cleared() {
        let f = fixture();
        f.sessions
            .put("s1", b"not a token".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        let state = f.manager.resolve_session("s1").await.unwrap();
        assert_eq!(state, SessionState::Anonymous);
        assert!(f.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_idle_token_is_anonymous() {
        let f = fixture();
        let stale = IdentityToken::mint(&f.user, &FieldEquality, now_ms() - 13 * 3600 * 1000)
            .unwrap()
            .encode(&f.manager.config.token_secret)
            .unwrap();
        f.sessions
            .put("s1", stale, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            f.manager.resolve_session("s1").await.unwrap(),
            SessionState::Anonymous
        );
        assert!(f.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_vanished_user_rejected() {
        let f = fixture();
        f.manager.establish_session("s1", &f.user).await.unwrap();
        f.users.remove(&f.user.id);

        assert_eq!(
            f.manager.resolve_session("s1").await.unwrap(),
            SessionState::Rejected(RejectionReason::UserVanished)
        );
        assert_eq!(
            f.manager.resolve_session("s1").await.unwrap(),
            SessionState::Anonymous
        );
    }

    #[tokio::test]
    async fn test_locked_user_rejected() {
        let f = fixture();
        f.manager.establish_session("s1", &f.user).await.unwrap();
        f.users.insert(
            f.user
                .clone()
                .with_status(StatusFlags::ACTIVE.with_account_non_locked(false)),
        );

        assert_eq!(
            f.manager.resolve_session("s1").await.unwrap(),
            SessionState::Rejected(RejectionReason::AccountStatus(
                StatusViolation::AccountLocked
            ))
        );
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_anonymous() {
        let f = fixture();
        let forged = IdentityToken::mint(&f.user, &FieldEquality, now_ms())
            .unwrap()
            .encode(b"some-other-secret")
            .unwrap();
        f.sessions
            .put("s1", forged, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            f.manager.resolve_session("s1").await.unwrap(),
            SessionState::Anonymous
        );
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let f = fixture();
        f.manager.establish_session("s1", &f.user).await.unwrap();

        f.manager.invalidate_session("s1").await.unwrap();
        f.manager.invalidate_session("s1").await.unwrap();

        assert_eq!(
            f.manager.resolve_session("s1").await.unwrap(),
            SessionState::Anonymous
        );
    }

    #[test]
    fn test_rejection_maps_to_error() {
        assert!(matches!(
            AuthError::from(RejectionReason::DriftDetected),
            AuthError::DriftDetected
        ));
        assert!(matches!(
            AuthError::from(RejectionReason::AccountStatus(StatusViolation::AccountExpired)),
            AuthError::AccountExpired
        ));
        assert_eq!(
            RejectionReason::AccountStatus(StatusViolation::AccountDisabled).to_string(),
            format!("account_status:{}", StatusViolation::AccountDisabled.code())
        );
    }

    /// User store whose id lookup deletes or replaces session `s1`,
    /// as a concurrent request would
    struct InterleavedLookup {
        users: Arc<InMemoryUserStore>,
        sessions: Arc<InMemorySessionStore>,
        replacement: Option<Vec<u8>>,
    }

    impl UserStore for InterleavedLookup {
        async fn find_by_property(
            &self,
            property: UserProperty,
            value: &str,
        ) -> AuthResult<Option<UserRecord>> {
            self.users.find_by_property(property, value).await
        }

        async fn find_by_predicate(
            &self,
            predicate: &UserPredicate,
        ) -> AuthResult<Option<UserRecord>> {
            self.users.find_by_predicate(predicate).await
        }

        async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<UserRecord>> {
            match &self.replacement {
                Some(bytes) => {
                    self.sessions
                        .put("s1", bytes.clone(), Duration::from_secs(60))
                        .await?
                }
                None => self.sessions.delete("s1").await?,
            }
            self.users.find_by_id(user_id).await
        }
    }

    fn interleaved(
        f: &Fixture,
        replacement: Option<Vec<u8>>,
    ) -> SessionIdentityManager<InterleavedLookup, InMemorySessionStore> {
        SessionIdentityManager::new(
            Arc::new(InterleavedLookup {
                users: Arc::clone(&f.users),
                sessions: Arc::clone(&f.sessions),
                replacement,
            }),
            Arc::clone(&f.sessions),
            Arc::clone(&f.manager.config),
        )
    }

    #[tokio::test]
    async fn test_logout_during_resolve_is_not_undone() {
        let f = fixture();
        f.manager.establish_session("s1", &f.user).await.unwrap();

        assert_eq!(
            interleaved(&f, None).resolve_session("s1").await.unwrap(),
            SessionState::Anonymous
        );
        assert!(f.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_refresh_keeps_newer_token() {
        let f = fixture();
        f.manager.establish_session("s1", &f.user).await.unwrap();

        let newer = IdentityToken::mint(&f.user, &FieldEquality, now_ms() + 1)
            .unwrap()
            .encode(&f.manager.config.token_secret)
            .unwrap();
        let racing = interleaved(&f, Some(newer.clone()));

        assert_eq!(
            racing.resolve_session("s1").await.unwrap(),
            SessionState::Authenticated(f.user.clone())
        );
        assert_eq!(f.sessions.get("s1").await.unwrap(), Some(newer));
    }
}
