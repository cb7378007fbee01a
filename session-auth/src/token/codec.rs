use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::Hmac;
use hmac::Mac;
use serde_json::Value;
use sha2::Sha256;

use super::canonical;
use super::claims::Claims;
use super::errors::TokenError;

type HmacSha256 = Hmac<Sha256>;

/// Canonical JSON of the only header this codec emits.
const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"TOKEN"}"#;

const SEGMENT_SEPARATOR: char = '.';

/// Signed session token codec.
///
/// Tokens are `header.claims.signature`, each segment base64url without padding.
/// Header and claims are canonical JSON; the signature is HMAC-SHA256 over the
/// first two encoded segments joined by `.`. The key is fixed for the lifetime
/// of the codec.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
    encoded_header: String,
}

impl TokenCodec {
    /// Create a codec with a signing key.
    ///
    /// # Arguments
    /// * `secret` - Signing key
    ///
    /// # Errors
    /// * `InvalidKey` - Key is empty
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidKey);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::InvalidKey)?;

        Ok(Self {
            mac,
            encoded_header: URL_SAFE_NO_PAD.encode(HEADER_JSON),
        })
    }

    /// Sign claims into a token.
    ///
    /// The codec does not choose an expiry; claims must already carry an integer `exp`.
    ///
    /// # Arguments
    /// * `claims` - Claims to sign
    ///
    /// # Returns
    /// Token string
    ///
    /// # Errors
    /// * `MissingExpiry` - Claims have no integer `exp`
    /// * `MalformedPayload` - Claims could not be serialized
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        if claims.expiration().is_none() {
            return Err(TokenError::MissingExpiry);
        }

        let payload = canonical::to_vec(claims)
            .map_err(|e| TokenError::MalformedPayload(e.to_string()))?;
        let encoded_payload = URL_SAFE_NO_PAD.encode(payload);

        let signature = self
            .mac
            .clone()
            .chain_update(self.encoded_header.as_bytes())
            .chain_update([SEGMENT_SEPARATOR as u8])
            .chain_update(encoded_payload.as_bytes())
            .finalize()
            .into_bytes();

        Ok(format!(
            "{}{sep}{}{sep}{}",
            self.encoded_header,
            encoded_payload,
            URL_SAFE_NO_PAD.encode(signature),
            sep = SEGMENT_SEPARATOR
        ))
    }

    /// Verify a token against the current time.
    ///
    /// See [`TokenCodec::verify_at`].
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token and return its claims.
    ///
    /// # Arguments
    /// * `token` - Token string
    /// * `current_timestamp` - Unix time the expiry is checked against
    ///
    /// # Returns
    /// Claims exactly as they were issued
    ///
    /// # Errors
    /// * `MalformedToken` - Token is not three `.`-separated segments
    /// * `BadSignature` - Signature is undecodable or does not match
    /// * `MalformedPayload` - Claims segment is not a base64url JSON object
    /// * `MissingExpiry` - Claims have no integer `exp`
    /// * `Expired` - `exp` is before `current_timestamp`
    pub fn verify_at(&self, token: &str, current_timestamp: i64) -> Result<Claims, TokenError> {
        let segments: Vec<&str> = token.split(SEGMENT_SEPARATOR).collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(TokenError::MalformedToken);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::BadSignature)?;

        self.mac
            .clone()
            .chain_update(header.as_bytes())
            .chain_update([SEGMENT_SEPARATOR as u8])
            .chain_update(payload.as_bytes())
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| TokenError::MalformedPayload(e.to_string()))?;
        let claims = match serde_json::from_slice::<Value>(&payload) {
            Ok(Value::Object(map)) => Claims::from(map),
            Ok(_) => {
                return Err(TokenError::MalformedPayload(
                    "claims must be a JSON object".to_string(),
                ))
            }
            Err(e) => return Err(TokenError::MalformedPayload(e.to_string())),
        };

        let exp = claims.expiration().ok_or(TokenError::MissingExpiry)?;
        if exp < current_timestamp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("encoded_header", &self.encoded_header)
            .finish_non_exhaustive()
    }
}
