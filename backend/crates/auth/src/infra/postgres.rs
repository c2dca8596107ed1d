//! PostgreSQL Store Implementations
//!
//! Tables are created by `database/migrations` (see `authctl migrate`).

use std::time::Duration;

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entity::user::UserRecord;
use crate::domain::repository::{SessionStore, UserPredicate, UserProperty, UserStore};
use crate::domain::value_object::{user_id::UserId, user_role::Roles, user_status::StatusFlags};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = "id, username, email, password_hash, salt, account_non_expired, \
     account_non_locked, credentials_non_expired, enabled, roles";

// ============================================================================
// User Store
// ============================================================================

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(&self, predicate: &UserPredicate) -> AuthResult<Option<UserRecord>> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE "));
        push_predicate(&mut query, predicate);
        query.push(" LIMIT 1");

        let row = query
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_record).transpose()
    }
}

impl UserStore for PgUserStore {
    async fn find_by_property(
        &self,
        property: UserProperty,
        value: &str,
    ) -> AuthResult<Option<UserRecord>> {
        self.fetch_where(&UserPredicate::eq(property, value)).await
    }

    async fn find_by_predicate(
        &self,
        predicate: &UserPredicate,
    ) -> AuthResult<Option<UserRecord>> {
        self.fetch_where(predicate).await
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_record).transpose()
    }
}

/// Column names come from [`UserProperty`]; values are always bound.
fn push_predicate(query: &mut QueryBuilder<'_, Postgres>, predicate: &UserPredicate) {
    match predicate {
        UserPredicate::Eq(property, value) => {
            query.push(column(*property));
            query.push(" = ");
            query.push_bind(value.clone());
        }
        UserPredicate::EqIgnoreCase(property, value) => {
            query.push("lower(");
            query.push(column(*property));
            query.push(") = lower(");
            query.push_bind(value.clone());
            query.push(")");
        }
        UserPredicate::Any(predicates) => push_group(query, predicates, " OR ", "FALSE"),
        UserPredicate::All(predicates) => push_group(query, predicates, " AND ", "TRUE"),
    }
}

fn push_group(
    query: &mut QueryBuilder<'_, Postgres>,
    predicates: &[UserPredicate],
    separator: &str,
    empty: &str,
) {
    if predicates.is_empty() {
        query.push(empty);
        return;
    }

    query.push("(");
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            query.push(separator);
        }
        push_predicate(query, predicate);
    }
    query.push(")");
}

const fn column(property: UserProperty) -> &'static str {
    match property {
        UserProperty::Username => "username",
        UserProperty::Email => "email",
    }
}

// ============================================================================
// Session Store
// ============================================================================

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Remove expired rows
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms <= $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

impl SessionStore for PgSessionStore {
    async fn get(&self, session_id: &str) -> AuthResult<Option<Vec<u8>>> {
        let now_ms = Utc::now().timestamp_millis();

        let payload = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT payload FROM auth_sessions WHERE session_id = $1 AND expires_at_ms > $2",
        )
        .bind(session_id)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payload)
    }

    async fn put(&self, session_id: &str, payload: Vec<u8>, ttl: Duration) -> AuthResult<()> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at_ms = Utc::now().timestamp_millis().saturating_add(ttl_ms);

        sqlx::query(
            r#"
            INSERT INTO auth_sessions (session_id, payload, expires_at_ms)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_id)
            DO UPDATE SET payload = EXCLUDED.payload, expires_at_ms = EXCLUDED.expires_at_ms
            "#,
        )
        .bind(session_id)
        .bind(payload)
        .bind(expires_at_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, session_id: &str) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    salt: Option<String>,
    account_non_expired: bool,
    account_non_locked: bool,
    credentials_non_expired: bool,
    enabled: bool,
    roles: Vec<String>,
}

impl UserRow {
    fn into_record(self) -> AuthResult<UserRecord> {
        let roles = Roles::from_names(self.roles)
            .map_err(|e| AuthError::Internal(format!("Invalid roles for user {}: {e}", self.id)))?;

        Ok(UserRecord {
            id: UserId::from_uuid(self.id),
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            salt: self.salt,
            status_flags: StatusFlags {
                account_non_expired: self.account_non_expired,
                account_non_locked: self.account_non_locked,
                credentials_non_expired: self.credentials_non_expired,
                enabled: self.enabled,
            },
            roles,
        })
    }
}
