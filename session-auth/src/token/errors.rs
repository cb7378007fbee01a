use thiserror::Error;

/// Error type for token operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Signing key must not be empty")]
    InvalidKey,

    #[error("Token does not have three segments")]
    MalformedToken,

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token payload is invalid: {0}")]
    MalformedPayload(String),

    #[error("Token is missing an integer exp claim")]
    MissingExpiry,

    #[error("Token is expired")]
    Expired,

    #[error("Token subject is missing or not an integer")]
    InvalidSubject,
}
