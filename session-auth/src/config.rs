use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::password::DEFAULT_KDF_ITERATIONS;
use crate::password::MIN_KDF_ITERATIONS;

/// Default session lifetime: one day.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60 * 24;

/// Process-wide authentication settings, fixed at startup.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing key. Replacing it invalidates every issued token.
    pub signing_key: String,

    /// PBKDF2 iteration count. Changing it invalidates every stored digest.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Lifetime of session tokens issued without an explicit TTL.
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: i64,
}

/// Error for invalid authentication settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Signing key must not be empty")]
    EmptySigningKey,

    #[error("KDF iteration count too low: minimum {min}, got {actual}")]
    IterationsTooLow { min: u32, actual: u32 },

    #[error("Token TTL must be positive, got {0}")]
    InvalidTokenTtl(i64),
}

fn default_kdf_iterations() -> u32 {
    DEFAULT_KDF_ITERATIONS
}

fn default_token_ttl_seconds() -> i64 {
    DEFAULT_TOKEN_TTL_SECONDS
}

impl AuthConfig {
    /// Settings with a signing key and default iteration count and TTL.
    pub fn new(signing_key: impl Into<String>) -> Self {
        Self {
            signing_key: signing_key.into(),
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    pub fn with_kdf_iterations(mut self, kdf_iterations: u32) -> Self {
        self.kdf_iterations = kdf_iterations;
        self
    }

    pub fn with_token_ttl_seconds(mut self, token_ttl_seconds: i64) -> Self {
        self.token_ttl_seconds = token_ttl_seconds;
        self
    }

    /// Check the settings before any component is built from them.
    ///
    /// # Errors
    /// * `EmptySigningKey` - Signing key is empty
    /// * `IterationsTooLow` - Iteration count is below the minimum
    /// * `InvalidTokenTtl` - TTL is zero or negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_key.is_empty() {
            return Err(ConfigError::EmptySigningKey);
        }
        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(ConfigError::IterationsTooLow {
                min: MIN_KDF_ITERATIONS,
                actual: self.kdf_iterations,
            });
        }
        if self.token_ttl_seconds <= 0 {
            return Err(ConfigError::InvalidTokenTtl(self.token_ttl_seconds));
        }
        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_key", &"<redacted>")
            .field("kdf_iterations", &self.kdf_iterations)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}
