pub mod errors;
pub mod kdf;

pub use errors::PasswordError;
pub use kdf::PasswordHasher;
pub use kdf::DEFAULT_KDF_ITERATIONS;
pub use kdf::MIN_KDF_ITERATIONS;
