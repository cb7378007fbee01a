use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Opaque user key carried as the token subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(pub i64);

impl UserKey {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserKey {
    fn from(key: i64) -> Self {
        Self(key)
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stored login credential.
///
/// Only the digest record is ever held; `Debug` output redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub user_key: UserKey,
    pub password_digest: String,
}

impl Credential {
    pub fn new(user_key: UserKey, password_digest: String) -> Self {
        Self {
            user_key,
            password_digest,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_key", &self.user_key)
            .field("password_digest", &"<redacted>")
            .finish()
    }
}

/// Error type for credential lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

/// Credential lookups the gate depends on.
///
/// Implemented by whatever persists users; I/O happens inside the implementation.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Retrieve the credential for a user key.
    ///
    /// # Returns
    /// Optional credential (None if not found)
    ///
    /// # Errors
    /// * `Unavailable` - Backing store failed
    async fn find_by_key(&self, key: UserKey) -> Result<Option<Credential>, StoreError>;

    /// Retrieve the credential registered under a login identifier (email).
    ///
    /// # Returns
    /// Optional credential (None if not found)
    ///
    /// # Errors
    /// * `Unavailable` - Backing store failed
    async fn find_by_login(&self, login: &str) -> Result<Option<Credential>, StoreError>;
}
