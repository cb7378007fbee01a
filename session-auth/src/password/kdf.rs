use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use super::errors::PasswordError;

/// PBKDF2 iteration count used unless configured otherwise.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Lowest iteration count a hasher can be built with.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Derived key length in bytes (one SHA-256 block).
const KEY_LEN: usize = 32;

/// Separator between the encoded salt and the encoded derived key.
const RECORD_SEPARATOR: char = ':';

/// Password hashing implementation.
///
/// Produces digest records of the form `b64url(salt):b64url(derived_key)` using
/// PBKDF2-HMAC-SHA256. The iteration count is not stored in the record, so every
/// hasher that verifies a record must use the count it was created with.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    /// Create a hasher with the default iteration count.
    pub fn new() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
        }
    }

    /// Create a hasher with a custom iteration count.
    ///
    /// # Errors
    /// * `IterationsTooLow` - Count is below [`MIN_KDF_ITERATIONS`]
    pub fn with_iterations(iterations: u32) -> Result<Self, PasswordError> {
        if iterations < MIN_KDF_ITERATIONS {
            return Err(PasswordError::IterationsTooLow {
                min: MIN_KDF_ITERATIONS,
                actual: iterations,
            });
        }
        Ok(Self { iterations })
    }

    /// Configured iteration count.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// Digest record `b64url(salt):b64url(derived_key)`
    ///
    /// # Errors
    /// * `HashingFailed` - The OS entropy source could not produce a salt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        let derived = self.derive(password, &salt);

        Ok(format!(
            "{}{}{}",
            URL_SAFE_NO_PAD.encode(salt),
            RECORD_SEPARATOR,
            URL_SAFE_NO_PAD.encode(derived)
        ))
    }

    /// Verify a password against a stored digest record.
    ///
    /// This is a total function. A record that is missing its separator, has
    /// undecodable parts or a derived key of the wrong length is treated as a
    /// non-match rather than an error.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `record` - Stored digest record
    ///
    /// # Returns
    /// True if the password matches the record
    pub fn verify(&self, password: &str, record: &str) -> bool {
        let Some((salt, expected)) = Self::parse_record(record) else {
            tracing::debug!("Digest record is malformed");
            return false;
        };

        let derived = self.derive(password, &salt);
        constant_time_eq(&derived, &expected)
    }

    /// Spend one KDF evaluation without comparing anything.
    ///
    /// Used when no record exists so that a lookup miss costs as much as a mismatch.
    pub fn burn(&self, password: &str) {
        let _ = self.derive(password, &[0u8; SALT_LEN]);
    }

    fn derive(&self, password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, self.iterations, &mut key);
        key
    }

    fn parse_record(record: &str) -> Option<(Vec<u8>, Vec<u8>)> {
        let (salt, key) = record.split_once(RECORD_SEPARATOR)?;
        if salt.is_empty() || key.contains(RECORD_SEPARATOR) {
            return None;
        }

        let salt = URL_SAFE_NO_PAD.decode(salt).ok()?;
        let key = URL_SAFE_NO_PAD.decode(key).ok()?;
        if key.len() != KEY_LEN {
            return None;
        }

        Some((salt, key))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare two byte strings without short-circuiting on the first difference.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
