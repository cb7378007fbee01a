use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Subject claim name.
pub const SUBJECT: &str = "sub";

/// Expiration claim name.
pub const EXPIRATION: &str = "exp";

/// Issued-at claim name.
pub const ISSUED_AT: &str = "iat";

/// Token claims.
///
/// A JSON object keyed by claim name. Sessions carry an integer `sub` and an
/// integer `exp` (Unix timestamp); any other claim is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Create new empty claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create session claims for a subject expiring at `expires_at`.
    pub fn for_subject(subject: i64, expires_at: i64) -> Self {
        Self::new()
            .with_subject(subject)
            .with_expiration(expires_at)
    }

    /// Set subject.
    pub fn with_subject(mut self, sub: i64) -> Self {
        self.0.insert(SUBJECT.to_string(), Value::from(sub));
        self
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.0.insert(EXPIRATION.to_string(), Value::from(exp));
        self
    }

    /// Set issued at (Unix timestamp).
    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.0.insert(ISSUED_AT.to_string(), Value::from(iat));
        self
    }

    /// Add a custom claim. Values that cannot be represented as JSON are skipped.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.0.insert(key.to_string(), json_value);
        }
        self
    }

    /// Raw claim value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Integer subject, if present.
    pub fn subject(&self) -> Option<i64> {
        self.0.get(SUBJECT).and_then(Value::as_i64)
    }

    /// Integer expiration, if present.
    pub fn expiration(&self) -> Option<i64> {
        self.0.get(EXPIRATION).and_then(Value::as_i64)
    }

    /// Check if token is expired.
    ///
    /// A token is still valid during the second named by `exp`. Claims without an
    /// integer `exp` never report expiry here; the codec rejects them separately.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.expiration()
            .map_or(false, |exp| exp < current_timestamp)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_claims() {
        let claims = Claims::new().with_subject(7);
        assert_eq!(claims.subject(), Some(7));
        assert!(claims.expiration().is_none());
    }

    #[test]
    fn test_for_subject() {
        let claims = Claims::for_subject(42, 1_700_000_000);

        assert_eq!(claims.subject(), Some(42));
        assert_eq!(claims.expiration(), Some(1_700_000_000));
        assert_eq!(claims.as_map().len(), 2);
    }

    #[test]
    fn test_builder_pattern() {
        let claims = Claims::new()
            .with_subject(42)
            .with_expiration(1234567890)
            .with_issued_at(1234567800)
            .with_extra("role", "student");

        assert_eq!(claims.subject(), Some(42));
        assert_eq!(claims.expiration(), Some(1234567890));
        assert_eq!(claims.get(ISSUED_AT), Some(&json!(1234567800)));
        assert_eq!(claims.get("role").and_then(Value::as_str), Some("student"));
    }

    #[test]
    fn test_non_integer_claims_are_not_read_as_integers() {
        let map = json!({ "sub": "42", "exp": 1700000000.5 });
        let Value::Object(map) = map else {
            unreachable!()
        };
        let claims = Claims::from(map);

        assert_eq!(claims.subject(), None);
        assert_eq!(claims.expiration(), None);
    }

    #[test]
    fn test_is_expired() {
        let claims = Claims::new().with_expiration(1000);

        assert!(!claims.is_expired(999)); // Not expired
        assert!(!claims.is_expired(1000)); // Exactly at expiration
        assert!(claims.is_expired(1001)); // Expired
    }

    #[test]
    fn test_is_expired_no_exp_claim() {
        let claims = Claims::new();
        assert!(!claims.is_expired(9999999999));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let claims = Claims::for_subject(1, 2).with_extra("scope", vec!["read"]);
        let value = serde_json::to_value(&claims).expect("Failed to serialize");
        assert_eq!(value, json!({ "sub": 1, "exp": 2, "scope": ["read"] }));
    }
}
