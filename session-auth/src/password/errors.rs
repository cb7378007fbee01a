use thiserror::Error;

/// Error type for password operations.
///
/// Verification has no error type: a record that cannot be parsed simply does not match.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("KDF iteration count too low: minimum {min}, got {actual}")]
    IterationsTooLow { min: u32, actual: u32 },
}
