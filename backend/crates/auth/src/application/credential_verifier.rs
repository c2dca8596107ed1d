//! Credential Verifier
//!
//! Resolves a login identifier to a user record, checks the password and
//! runs the account status gate. Performs no writes.
//!
//! Every attempt that gets past input validation costs one codec
//! verification, whether or not the identifier exists, so response time
//! does not reveal which accounts exist.

use std::sync::Arc;

use platform::password::{ClearTextPassword, PasswordCodec};

use crate::application::config::{AuthConfig, LoginLookup};
use crate::domain::entity::user::UserRecord;
use crate::domain::repository::UserStore;
use crate::error::{AuthError, AuthResult};

const DECOY_PASSWORD: &str = "decoy-password-never-matches";
const DECOY_SALT: &str = "decoy";

/// Stored encoding verified against when there is no real one to check
struct Decoy {
    encoded: String,
    salt: Option<String>,
}

impl Decoy {
    fn new(codec: &dyn PasswordCodec) -> AuthResult<Self> {
        let salt = (!codec.embeds_salt()).then(|| DECOY_SALT.to_string());
        let password = ClearTextPassword::new(DECOY_PASSWORD.to_string())?;
        let encoded = codec.encode(&password, salt.as_deref())?;
        Ok(Self { encoded, salt })
    }
}

pub struct CredentialVerifier<U>
where
    U: UserStore,
{
    user_store: Arc<U>,
    codec: Arc<dyn PasswordCodec>,
    decoy: Arc<Decoy>,
    config: Arc<AuthConfig>,
}

impl<U> CredentialVerifier<U>
where
    U: UserStore,
{
    /// Build a verifier using the codec selected in `config`
    pub fn new(user_store: Arc<U>, config: Arc<AuthConfig>) -> AuthResult<Self> {
        let codec = config.password_codec()?;
        Self::with_codec(user_store, codec, config)
    }

    /// Build a verifier around an explicit codec.
    ///
    /// Hashes the decoy password once, so this costs one `encode`.
    pub fn with_codec(
        user_store: Arc<U>,
        codec: Arc<dyn PasswordCodec>,
        config: Arc<AuthConfig>,
    ) -> AuthResult<Self> {
        let decoy = Arc::new(Decoy::new(codec.as_ref())?);
        Ok(Self {
            user_store,
            codec,
            decoy,
            config,
        })
    }

    /// Check `plaintext` for the user `identifier` resolves to.
    ///
    /// Returns the stored record unchanged on success. The status gate runs
    /// only after the password matched.
    pub async fn authenticate(
        &self,
        identifier: &str,
        plaintext: String,
    ) -> AuthResult<UserRecord> {
        let user = self.lookup(identifier).await?;
        let password = ClearTextPassword::new(plaintext).map_err(|_| match user {
            Some(_) => AuthError::BadCredentials,
            None => AuthError::UnknownIdentity,
        })?;

        let Some(user) = user else {
            self.verify_decoy(password).await?;
            return Err(AuthError::UnknownIdentity);
        };

        if !self.codec.embeds_salt() && user.salt.is_none() {
            tracing::error!(
                user_id = %user.id,
                codec = self.codec.name(),
                "Stored user has no salt for a codec that requires one"
            );
            self.verify_decoy(password).await?;
            return Err(AuthError::BadCredentials);
        }

        let matched = self
            .verify_password(password, user.password_hash.clone(), user.salt.clone())
            .await?;
        if !matched {
            return Err(AuthError::BadCredentials);
        }

        user.check_status()?;

        tracing::info!(
            user_id = %user.id,
            codec = self.codec.name(),
            "Credentials verified"
        );

        Ok(user)
    }

    /// Hash a new password with the configured codec.
    ///
    /// `salt` is only used by codecs that do not embed one.
    pub async fn encode_password(
        &self,
        plaintext: String,
        salt: Option<String>,
    ) -> AuthResult<String> {
        let password = ClearTextPassword::new(plaintext)?;
        let codec = Arc::clone(&self.codec);

        let encoded =
            tokio::task::spawn_blocking(move || codec.encode(&password, salt.as_deref()))
                .await??;

        Ok(encoded)
    }

    /// Whether the stored hash should be replaced on next successful login
    pub fn needs_rehash(&self, user: &UserRecord) -> bool {
        self.codec.needs_rehash(&user.password_hash)
    }

    async fn lookup(&self, identifier: &str) -> AuthResult<Option<UserRecord>> {
        match &self.config.login_lookup {
            LoginLookup::Property(property) => {
                self.user_store.find_by_property(*property, identifier).await
            }
            LoginLookup::Predicate(build) => {
                let predicate = build(identifier);
                self.user_store.find_by_predicate(&predicate).await
            }
        }
    }

    /// Spend the same work as a real check; the result is discarded
    async fn verify_decoy(&self, password: ClearTextPassword) -> AuthResult<()> {
        let decoy = Arc::clone(&self.decoy);
        let codec = Arc::clone(&self.codec);

        tokio::task::spawn_blocking(move || {
            codec.verify(&password, &decoy.encoded, decoy.salt.as_deref())
        })
        .await??;

        Ok(())
    }

    /// Runs the codec on the blocking pool
    async fn verify_password(
        &self,
        password: ClearTextPassword,
        encoded: String,
        salt: Option<String>,
    ) -> AuthResult<bool> {
        let codec = Arc::clone(&self.codec);

        let matched = tokio::task::spawn_blocking(move || {
            codec.verify(&password, &encoded, salt.as_deref())
        })
        .await??;

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use platform::password::{PasswordAlgorithm, PasswordHashError};

    use crate::domain::value_object::{user_id::UserId, user_status::StatusFlags};
    use crate::infra::memory::InMemoryUserStore;

    async fn setup(status: StatusFlags) -> CredentialVerifier<InMemoryUserStore> {
        let config = Arc::new(AuthConfig::development());
        let store = Arc::new(InMemoryUserStore::new());
        let verifier = CredentialVerifier::new(Arc::clone(&store), config).unwrap();

        let hash = verifier
            .encode_password("correct horse".to_string(), None)
            .await
            .unwrap();
        store.insert(
            UserRecord::new(UserId::new(), "alice", "alice@example.com", hash).with_status(status),
        );

        verifier
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let verifier = setup(StatusFlags::ACTIVE).await;
        let user = verifier
            .authenticate("alice", "correct horse".to_string())
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_unknown_identity() {
        let verifier = setup(StatusFlags::ACTIVE).await;
        let err = verifier
            .authenticate("mallory", "correct horse".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownIdentity));
    }

    #[tokio::test]
    async fn test_wrong_and_empty_password() {
        let verifier = setup(StatusFlags::ACTIVE).await;

        let wrong = verifier
            .authenticate("alice", "battery staple".to_string())
            .await
            .unwrap_err();
        assert!(matches!(wrong, AuthError::BadCredentials));

        let empty = verifier
            .authenticate("alice", String::new())
            .await
            .unwrap_err();
        assert!(matches!(empty, AuthError::BadCredentials));
    }

    #[tokio::test]
    async fn test_status_checked_after_password() {
        let verifier = setup(StatusFlags::ACTIVE.with_enabled(false)).await;

        let wrong = verifier
            .authenticate("alice", "battery staple".to_string())
            .await
            .unwrap_err();
        assert!(matches!(wrong, AuthError::BadCredentials));

        let right = verifier
            .authenticate("alice", "correct horse".to_string())
            .await
            .unwrap_err();
        assert!(matches!(right, AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn test_email_login_requires_predicate_lookup() {
        let verifier = setup(StatusFlags::ACTIVE).await;
        let err = verifier
            .authenticate("alice@example.com", "correct horse".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownIdentity));

        let config = Arc::new(AuthConfig {
            login_lookup: LoginLookup::username_or_email(),
            ..AuthConfig::development()
        });
        let by_email = CredentialVerifier::with_codec(
            Arc::clone(&verifier.user_store),
            Arc::clone(&verifier.codec),
            config,
        )
        .unwrap();
        let user = by_email
            .authenticate("alice@example.com", "correct horse".to_string())
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_needs_rehash_after_cost_increase() {
        let verifier = setup(StatusFlags::ACTIVE).await;
        let user = verifier
            .authenticate("alice", "correct horse".to_string())
            .await
            .unwrap();
        assert!(!verifier.needs_rehash(&user));

        let stronger = Arc::new(AuthConfig::default());
        let upgraded = CredentialVerifier::new(Arc::clone(&verifier.user_store), stronger).unwrap();
        assert!(upgraded.needs_rehash(&user));
    }

    /// Delegates to a real codec and counts `verify` calls
    struct CountingCodec {
        inner: Arc<dyn PasswordCodec>,
        verifies: AtomicUsize,
    }

    impl CountingCodec {
        fn wrap(inner: Arc<dyn PasswordCodec>) -> Arc<Self> {
            Arc::new(Self {
                inner,
                verifies: AtomicUsize::new(0),
            })
        }

        fn verifies(&self) -> usize {
            self.verifies.load(Ordering::SeqCst)
        }
    }

    impl PasswordCodec for CountingCodec {
        fn name(&self) -> &'static str {
            self.inner.name()
        }

        fn embeds_salt(&self) -> bool {
            self.inner.embeds_salt()
        }

        fn encode(
            &self,
            password: &ClearTextPassword,
            salt: Option<&str>,
        ) -> Result<String, PasswordHashError> {
            self.inner.encode(password, salt)
        }

        fn verify(
            &self,
            password: &ClearTextPassword,
            encoded: &str,
            salt: Option<&str>,
        ) -> Result<bool, PasswordHashError> {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            self.inner.verify(password, encoded, salt)
        }

        fn needs_rehash(&self, encoded: &str) -> bool {
            self.inner.needs_rehash(encoded)
        }
    }

    fn counting_verifier(
        algorithm: PasswordAlgorithm,
    ) -> (
        Arc<InMemoryUserStore>,
        Arc<CountingCodec>,
        CredentialVerifier<InMemoryUserStore>,
    ) {
        let store = Arc::new(InMemoryUserStore::new());
        let codec = CountingCodec::wrap(algorithm.codec(None).unwrap());
        let config = Arc::new(AuthConfig {
            password_algorithm: algorithm,
            ..AuthConfig::development()
        });
        let verifier = CredentialVerifier::with_codec(
            Arc::clone(&store),
            Arc::clone(&codec) as Arc<dyn PasswordCodec>,
            config,
        )
        .unwrap();
        (store, codec, verifier)
    }

    #[tokio::test]
    async fn test_unknown_identity_costs_one_verification() {
        let (store, codec, verifier) =
            counting_verifier(AuthConfig::development().password_algorithm);
        let hash = verifier
            .encode_password("correct horse".to_string(), None)
            .await
            .unwrap();
        store.insert(UserRecord::new(UserId::new(), "alice", "alice@example.com", hash));
        assert_eq!(codec.verifies(), 0);

        let unknown = verifier
            .authenticate("mallory", "correct horse".to_string())
            .await
            .unwrap_err();
        assert!(matches!(unknown, AuthError::UnknownIdentity));
        assert_eq!(codec.verifies(), 1);

        let wrong = verifier
            .authenticate("alice", "battery staple".to_string())
            .await
            .unwrap_err();
        assert!(matches!(wrong, AuthError::BadCredentials));
        assert_eq!(codec.verifies(), 2);
    }

    #[tokio::test]
    async fn test_missing_salt_is_bad_credentials() {
        let (store, codec, verifier) =
            counting_verifier(PasswordAlgorithm::Sha256Digest { iterations: 10 });
        let hash = verifier
            .encode_password("correct horse".to_string(), Some("s4lt".to_string()))
            .await
            .unwrap();
        store.insert(UserRecord::new(UserId::new(), "alice", "alice@example.com", hash));

        let err = verifier
            .authenticate("alice", "correct horse".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::BadCredentials));
        assert_eq!(err.to_app_error().status_code(), 401);
        assert_eq!(codec.verifies(), 1);
    }

    #[tokio::test]
    async fn test_explicit_salt_codec_round_trip() {
        let (store, _codec, verifier) =
            counting_verifier(PasswordAlgorithm::Sha256Digest { iterations: 10 });
        let hash = verifier
            .encode_password("correct horse".to_string(), Some("s4lt".to_string()))
            .await
            .unwrap();
        store.insert(
            UserRecord::new(UserId::new(), "alice", "alice@example.com", hash).with_salt("s4lt"),
        );

        assert!(verifier
            .authenticate("alice", "correct horse".to_string())
            .await
            .is_ok());
    }
}
