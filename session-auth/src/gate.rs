use std::sync::Arc;

use chrono::Utc;

use crate::config::AuthConfig;
use crate::config::ConfigError;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::password::MIN_KDF_ITERATIONS;
use crate::store::StoreError;
use crate::store::UserKey;
use crate::store::UserStore;
use crate::token::Claims;
use crate::token::TokenCodec;
use crate::token::TokenError;

/// Login coordinator combining credential lookup, password verification and
/// session token handling.
///
/// `NotFound` and `InvalidCredentials` stay distinct here so callers can log
/// them; anything user-facing must render both the same way.
pub struct CredentialGate<S>
where
    S: UserStore,
{
    store: Arc<S>,
    password_hasher: PasswordHasher,
    token_codec: TokenCodec,
    token_ttl_seconds: i64,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResult {
    pub user_key: UserKey,
    /// Session token
    pub access_token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Authentication operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationError {
    #[error("No account for this login")]
    NotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Password check did not complete: {0}")]
    Interrupted(String),
}

impl AuthenticationError {
    /// True for the outcomes that must be shown to users as one generic rejection.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthenticationError::NotFound | AuthenticationError::InvalidCredentials
        )
    }
}

impl<S> CredentialGate<S>
where
    S: UserStore,
{
    /// Create a new gate from validated settings.
    ///
    /// # Arguments
    /// * `config` - Signing key, KDF iteration count and default TTL
    /// * `store` - Credential lookups
    ///
    /// # Errors
    /// * `ConfigError` - Settings failed validation
    pub fn new(config: &AuthConfig, store: Arc<S>) -> Result<Self, ConfigError> {
        config.validate()?;

        let password_hasher = PasswordHasher::with_iterations(config.kdf_iterations).map_err(
            |_| ConfigError::IterationsTooLow {
                min: MIN_KDF_ITERATIONS,
                actual: config.kdf_iterations,
            },
        )?;
        let token_codec = TokenCodec::new(config.signing_key.as_bytes())
            .map_err(|_| ConfigError::EmptySigningKey)?;

        Ok(Self {
            store,
            password_hasher,
            token_codec,
            token_ttl_seconds: config.token_ttl_seconds,
        })
    }

    /// Default session lifetime in seconds.
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    /// Codec used for session tokens, for callers that need the full claims.
    pub fn token_codec(&self) -> &TokenCodec {
        &self.token_codec
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `HashingFailed` - Entropy source unavailable
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a login attempt.
    ///
    /// A lookup miss still costs one KDF evaluation. Both evaluations run on
    /// tokio's blocking pool, so this must be awaited inside a tokio runtime.
    ///
    /// # Arguments
    /// * `login` - Login identifier (email)
    /// * `password` - Plaintext password to verify
    ///
    /// # Returns
    /// Key of the authenticated user
    ///
    /// # Errors
    /// * `NotFound` - No credential for this login
    /// * `InvalidCredentials` - Password does not match the stored digest
    /// * `Store` - Credential lookup failed
    /// * `Interrupted` - The blocking KDF task panicked or was cancelled
    pub async fn authenticate(
        &self,
        login: &str,
        password: &str,
    ) -> Result<UserKey, AuthenticationError> {
        let credential = self.store.find_by_login(login).await?;
        let hasher = self.password_hasher;
        let password = password.to_owned();

        let Some(credential) = credential else {
            run_kdf(move || hasher.burn(&password)).await?;
            tracing::debug!("Login rejected: unknown login");
            return Err(AuthenticationError::NotFound);
        };

        let user_key = credential.user_key;
        let digest = credential.password_digest;
        if !run_kdf(move || hasher.verify(&password, &digest)).await? {
            tracing::debug!(user_key = %user_key, "Login rejected: password mismatch");
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(user_key)
    }

    /// Verify credentials and issue a session token with the default lifetime.
    ///
    /// # Errors
    /// * `NotFound` / `InvalidCredentials` - Login rejected
    /// * `Store` - Credential lookup failed
    /// * `Token` - Token generation failed
    pub async fn login(
        &self,
        login: &str,
        password: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        let user_key = self.authenticate(login, password).await?;
        let access_token = self.issue_session_token(user_key, self.token_ttl_seconds)?;

        tracing::info!(user_key = %user_key, "Session issued");

        Ok(AuthenticationResult {
            user_key,
            access_token,
            expires_in: self.token_ttl_seconds,
        })
    }

    /// Issue a session token for a user that expires `ttl_seconds` from now.
    pub fn issue_session_token(
        &self,
        user_key: UserKey,
        ttl_seconds: i64,
    ) -> Result<String, TokenError> {
        self.issue_session_token_at(user_key, ttl_seconds, Utc::now().timestamp())
    }

    /// Issue a session token with claims `{sub, exp: current_timestamp + ttl_seconds}`.
    pub fn issue_session_token_at(
        &self,
        user_key: UserKey,
        ttl_seconds: i64,
        current_timestamp: i64,
    ) -> Result<String, TokenError> {
        let claims = Claims::for_subject(
            user_key.as_i64(),
            current_timestamp.saturating_add(ttl_seconds),
        );
        self.token_codec.issue(&claims)
    }

    /// Resolve a session token to its user against the current time.
    pub fn resolve_session(&self, token: &str) -> Result<UserKey, TokenError> {
        self.resolve_session_at(token, Utc::now().timestamp())
    }

    /// Resolve a session token to its user.
    ///
    /// # Errors
    /// * Any `TokenCodec::verify_at` failure
    /// * `InvalidSubject` - `sub` is absent or not an integer
    pub fn resolve_session_at(
        &self,
        token: &str,
        current_timestamp: i64,
    ) -> Result<UserKey, TokenError> {
        let claims = self.token_codec.verify_at(token, current_timestamp)?;
        claims
            .subject()
            .map(UserKey)
            .ok_or(TokenError::InvalidSubject)
    }

    /// Resolve a session token and confirm its account still exists.
    ///
    /// # Errors
    /// * `Token` - Token failed to resolve
    /// * `NotFound` - Account was removed after the token was issued
    /// * `Store` - Credential lookup failed
    pub async fn resolve_account(&self, token: &str) -> Result<UserKey, AuthenticationError> {
        let user_key = self.resolve_session(token)?;

        match self.store.find_by_key(user_key).await? {
            Some(credential) => Ok(credential.user_key),
            None => {
                tracing::debug!(user_key = %user_key, "Session refers to a missing account");
                Err(AuthenticationError::NotFound)
            }
        }
    }
}

/// Run a KDF evaluation on the blocking pool so async workers keep serving.
async fn run_kdf<T, F>(work: F) -> Result<T, AuthenticationError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthenticationError::Interrupted(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;
    use mockall::mock;

    use super::*;
    use crate::store::Credential;

    const SECRET: &str = "test_secret_key_at_least_32_bytes!";
    const NOW: i64 = 1_700_000_000;

    mock! {
        pub TestUserStore {}

        #[async_trait]
        impl UserStore for TestUserStore {
            async fn find_by_key(&self, key: UserKey) -> Result<Option<Credential>, StoreError>;
            async fn find_by_login(&self, login: &str) -> Result<Option<Credential>, StoreError>;
        }
    }

    fn gate(store: MockTestUserStore) -> CredentialGate<MockTestUserStore> {
        CredentialGate::new(&AuthConfig::new(SECRET), Arc::new(store))
            .expect("Failed to create gate")
    }

    fn store_with(credential: Option<Credential>) -> MockTestUserStore {
        let mut store = MockTestUserStore::new();
        store
            .expect_find_by_login()
            .times(1)
            .returning(move |_| Ok(credential.clone()));
        store
    }

    fn digest(password: &str) -> String {
        PasswordHasher::new()
            .hash(password)
            .expect("Failed to hash password")
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let credential = Credential::new(UserKey(7), digest("my_password"));
        let gate = gate(store_with(Some(credential)));

        let user_key = gate
            .authenticate("ayse@example.com", "my_password")
            .await
            .expect("Authentication failed");

        assert_eq!(user_key, UserKey(7));
    }

    #[tokio::test]
    async fn test_authenticate_invalid_password() {
        let credential = Credential::new(UserKey(7), digest("my_password"));
        let gate = gate(store_with(Some(credential)));

        let result = gate.authenticate("ayse@example.com", "wrong_password").await;
        assert_eq!(result, Err(AuthenticationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_login() {
        let gate = gate(store_with(None));

        let result = gate.authenticate("nobody@example.com", "my_password").await;
        assert_eq!(result, Err(AuthenticationError::NotFound));
    }

    #[tokio::test]
    async fn test_authenticate_malformed_stored_digest() {
        let credential = Credential::new(UserKey(7), "not-a-digest".to_string());
        let gate = gate(store_with(Some(credential)));

        let result = gate.authenticate("ayse@example.com", "my_password").await;
        assert_eq!(result, Err(AuthenticationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_store_failure() {
        let mut store = MockTestUserStore::new();
        store
            .expect_find_by_login()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("connection reset".to_string())));
        let gate = gate(store);

        let result = gate.authenticate("ayse@example.com", "my_password").await;
        assert!(matches!(result, Err(AuthenticationError::Store(_))));
    }

    async fn ticks_during<F: std::future::Future>(work: F) -> (F::Output, usize) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let ticker = tokio::spawn(async move {
            loop {
                counter.fetch_add(1, Ordering::Relaxed);
                tokio::task::yield_now().await;
            }
        });

        let output = work.await;
        ticker.abort();
        (output, ticks.load(Ordering::Relaxed))
    }

    #[tokio::test]
    async fn test_login_leaves_runtime_responsive() {
        let credential = Credential::new(UserKey(7), digest("my_password"));
        let gate = gate(store_with(Some(credential)));

        // Single-threaded runtime: the ticker only advances while login is parked.
        let (result, ticks) = ticks_during(gate.login("ayse@example.com", "my_password")).await;

        assert!(result.is_ok());
        assert!(ticks > 10, "runtime stalled during login ({} ticks)", ticks);
    }

    #[tokio::test]
    async fn test_unknown_login_leaves_runtime_responsive() {
        let gate = gate(store_with(None));

        let (result, ticks) =
            ticks_during(gate.authenticate("nobody@example.com", "my_password")).await;

        assert_eq!(result, Err(AuthenticationError::NotFound));
        assert!(ticks > 10, "runtime stalled during lookup miss ({} ticks)", ticks);
    }

    #[test]
    fn test_rejections_are_grouped() {
        assert!(AuthenticationError::NotFound.is_rejection());
        assert!(AuthenticationError::InvalidCredentials.is_rejection());
        assert!(!AuthenticationError::Token(TokenError::Expired).is_rejection());
        assert!(
            !AuthenticationError::Store(StoreError::Unavailable("down".to_string()))
                .is_rejection()
        );
    }

    #[tokio::test]
    async fn test_login_issues_default_lifetime_token() {
        let credential = Credential::new(UserKey(7), digest("my_password"));
        let gate = gate(store_with(Some(credential)));

        let result = gate
            .login("ayse@example.com", "my_password")
            .await
            .expect("Login failed");

        assert_eq!(result.user_key, UserKey(7));
        assert_eq!(result.expires_in, 86_400);

        let claims = gate
            .token_codec()
            .verify(&result.access_token)
            .expect("Token validation failed");
        let now = Utc::now().timestamp();
        let exp = claims.expiration().expect("Missing exp");
        assert!(exp > now + 86_400 - 60 && exp <= now + 86_400);
        assert_eq!(claims.subject(), Some(7));
    }

    #[test]
    fn test_issue_session_token_claims() {
        let gate = gate(MockTestUserStore::new());

        let token = gate
            .issue_session_token_at(UserKey(42), 3600, NOW)
            .expect("Failed to issue token");
        let claims = gate
            .token_codec()
            .verify_at(&token, NOW)
            .expect("Token validation failed");

        assert_eq!(claims, Claims::for_subject(42, NOW + 3600));
    }

    #[test]
    fn test_resolve_session_invalid_subject() {
        let gate = gate(MockTestUserStore::new());
        let codec = gate.token_codec();

        let missing = codec
            .issue(&Claims::new().with_expiration(NOW + 60))
            .expect("Failed to issue token");
        assert_eq!(
            gate.resolve_session_at(&missing, NOW),
            Err(TokenError::InvalidSubject)
        );

        let textual = codec
            .issue(
                &Claims::new()
                    .with_expiration(NOW + 60)
                    .with_extra("sub", "42"),
            )
            .expect("Failed to issue token");
        assert_eq!(
            gate.resolve_session_at(&textual, NOW),
            Err(TokenError::InvalidSubject)
        );
    }

    #[test]
    fn test_resolve_session_propagates_token_failures() {
        let gate = gate(MockTestUserStore::new());

        assert_eq!(
            gate.resolve_session("invalid.token.here"),
            Err(TokenError::BadSignature)
        );
        assert_eq!(
            gate.resolve_session("not-a-token"),
            Err(TokenError::MalformedToken)
        );
    }

    #[tokio::test]
    async fn test_resolve_account() {
        let mut store = MockTestUserStore::new();
        store
            .expect_find_by_key()
            .withf(|key| *key == UserKey(7))
            .times(1)
            .returning(|key| Ok(Some(Credential::new(key, "digest".to_string()))));
        store
            .expect_find_by_key()
            .withf(|key| *key == UserKey(8))
            .times(1)
            .returning(|_| Ok(None));
        let gate = gate(store);

        let token = gate
            .issue_session_token(UserKey(7), 60)
            .expect("Failed to issue token");
        assert_eq!(gate.resolve_account(&token).await, Ok(UserKey(7)));

        let token = gate
            .issue_session_token(UserKey(8), 60)
            .expect("Failed to issue token");
        assert_eq!(
            gate.resolve_account(&token).await,
            Err(AuthenticationError::NotFound)
        );

        assert_eq!(
            gate.resolve_account("a.b").await,
            Err(AuthenticationError::Token(TokenError::MalformedToken))
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result =
            CredentialGate::new(&AuthConfig::new(""), Arc::new(MockTestUserStore::new()));
        assert!(matches!(result, Err(ConfigError::EmptySigningKey)));

        let result = CredentialGate::new(
            &AuthConfig::new(SECRET).with_kdf_iterations(1),
            Arc::new(MockTestUserStore::new()),
        );
        assert!(matches!(result, Err(ConfigError::IterationsTooLow { .. })));
    }

    #[tokio::test]
    async fn test_session_lifecycle_with_clock_advance() {
        // Registration: digest stored for the new account.
        let stored_digest = digest("S3cret!");
        let credential = Credential::new(UserKey(1001), stored_digest);
        let gate = gate(store_with(Some(credential)));

        let user_key = gate
            .authenticate("ayse@example.com", "S3cret!")
            .await
            .expect("Authentication failed");
        assert_eq!(user_key, UserKey(1001));

        let token = gate
            .issue_session_token_at(user_key, 86_400, NOW)
            .expect("Failed to issue token");
        assert_eq!(token.split('.').count(), 3);

        assert_eq!(gate.resolve_session_at(&token, NOW), Ok(UserKey(1001)));
        assert_eq!(
            gate.resolve_session_at(&token, NOW + 86_400),
            Ok(UserKey(1001))
        );
        assert_eq!(
            gate.resolve_session_at(&token, NOW + 86_401),
            Err(TokenError::Expired)
        );
    }
}
