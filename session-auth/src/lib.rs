//! Session authentication library
//!
//! Provides the authentication core shared by the account service:
//! - Password hashing (PBKDF2-HMAC-SHA256, salted digest records)
//! - Signed session tokens (HS256 over canonical JSON)
//! - Login coordination over a pluggable credential store
//!
//! Services own persistence and HTTP concerns; they implement [`UserStore`] and
//! present [`AuthenticationError::NotFound`] and
//! [`AuthenticationError::InvalidCredentials`] to users identically.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use session_auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let record = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &record));
//! assert!(!hasher.verify("my_password", "not-a-record"));
//! ```
//!
//! ## Session Tokens
//! ```
//! use session_auth::{Claims, TokenCodec};
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!").unwrap();
//! let claims = Claims::for_subject(42, 4_102_444_800).with_extra("role", "student");
//! let token = codec.issue(&claims).unwrap();
//! let decoded = codec.verify(&token).unwrap();
//! assert_eq!(decoded, claims);
//! ```
//!
//! ## Complete Authentication Flow
//! ```no_run
//! use std::sync::Arc;
//!
//! use session_auth::{AuthConfig, CredentialGate, UserStore};
//!
//! async fn sign_in<S: UserStore>(store: Arc<S>) {
//!     let gate = CredentialGate::new(&AuthConfig::new("supersecretkey"), store).unwrap();
//!
//!     // Login: verify against the stored digest and mint a token
//!     let result = gate.login("ayse@example.com", "S3cret!").await.unwrap();
//!
//!     // Later requests: resolve the token back to the user
//!     let user_key = gate.resolve_session(&result.access_token).unwrap();
//!     assert_eq!(user_key, result.user_key);
//! }
//! ```

pub mod config;
pub mod gate;
pub mod password;
pub mod store;
pub mod token;

// Re-export commonly used items
pub use config::AuthConfig;
pub use config::ConfigError;
pub use gate::AuthenticationError;
pub use gate::AuthenticationResult;
pub use gate::CredentialGate;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use store::Credential;
pub use store::StoreError;
pub use store::UserKey;
pub use store::UserStore;
pub use token::Claims;
pub use token::TokenCodec;
pub use token::TokenError;
