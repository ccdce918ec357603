use serde_json::Value;
use sha2::{Digest, Sha256};

/// Fields tried, in order, for an explicit message identifier
pub const ID_FIELDS: &[&str] = &["id", "_id", "message_id", "uuid"];
pub const TEXT_FIELDS: &[&str] = &["text", "message", "body"];
pub const SENDER_FIELDS: &[&str] = &["sender_name", "sender", "from"];
pub const TIMESTAMP_FIELDS: &[&str] = &["created_at", "timestamp"];

/// Sender fields that feed the content hash. `sender_name` is display-only.
const HASH_SENDER_FIELDS: &[&str] = &["sender", "from"];

/// Key used to recognise a message already relayed during this process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for IdentityKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single message as returned by the chat API.
/// The schema is not fixed, so fields are looked up by preference lists.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRecord {
    raw: Value,
}

impl MessageRecord {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// A field's value, treating JSON `null` as absent
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.raw.get(key).filter(|v| !v.is_null())
    }

    /// First field in `keys` holding a truthy value, stringified
    pub fn first_truthy(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| self.field(k))
            .find(|v| is_truthy(v))
            .map(stringify)
    }

    pub fn text(&self) -> Option<String> {
        self.first_truthy(TEXT_FIELDS)
    }

    pub fn sender(&self) -> Option<String> {
        self.first_truthy(SENDER_FIELDS)
    }

    pub fn timestamp(&self) -> Option<String> {
        self.first_truthy(TIMESTAMP_FIELDS)
    }

    /// Resolve the identity key: the first non-null ID field, or else a
    /// SHA-256 over `sender|timestamp|text`.
    pub fn identity(&self) -> IdentityKey {
        if let Some(id) = ID_FIELDS.iter().find_map(|k| self.field(k)) {
            return IdentityKey(stringify(id));
        }

        let sender = self.first_truthy(HASH_SENDER_FIELDS).unwrap_or_default();
        let ts = self.timestamp().unwrap_or_default();
        let text = self.text().unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(format!("{}|{}|{}", sender, ts, text).as_bytes());
        IdentityKey(format!("{:x}", hasher.finalize()))
    }
}

/// Loose truthiness: null, false, 0, "" and empty containers are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Strings render bare, everything else as compact JSON
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_prefers_id_field() {
        let a = MessageRecord::new(json!({"id": "1", "text": "hi", "sender": "A"}));
        let b = MessageRecord::new(json!({"id": "1", "text": "other", "sender": "B"}));
        assert_eq!(a.identity().as_str(), "1");
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_stringifies_numeric_id() {
        let record = MessageRecord::new(json!({"id": 42, "text": "hi"}));
        assert_eq!(record.identity().as_str(), "42");
    }

    #[test]
    fn test_identity_field_preference_order() {
        let record = MessageRecord::new(json!({"uuid": "u", "message_id": "m", "_id": "x"}));
        assert_eq!(record.identity().as_str(), "x");

        let record = MessageRecord::new(json!({"id": null, "uuid": "u"}));
        assert_eq!(record.identity().as_str(), "u");
    }

    #[test]
    fn test_identity_accepts_falsy_but_present_id() {
        let record = MessageRecord::new(json!({"id": 0, "text": "hi"}));
        assert_eq!(record.identity().as_str(), "0");
    }

    #[test]
    fn test_identity_hash_is_deterministic() {
        let record = MessageRecord::new(json!({
            "sender": "A",
            "created_at": "2024-01-01T00:00:00Z",
            "text": "hello"
        }));
        let first = record.identity();
        let second = record.identity();
        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
        assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_identity_hash_matches_delimited_content() {
        let record = MessageRecord::new(json!({"from": "A", "timestamp": 5, "body": "x"}));
        let mut hasher = Sha256::new();
        hasher.update(b"A|5|x");
        assert_eq!(
            record.identity().as_str(),
            format!("{:x}", hasher.finalize())
        );
    }

    #[test]
    fn test_identity_hash_differs_on_content() {
        let a = MessageRecord::new(json!({"sender": "A", "text": "hello"}));
        let b = MessageRecord::new(json!({"sender": "A", "text": "hello!"}));
        let c = MessageRecord::new(json!({"sender": "B", "text": "hello"}));
        assert_ne!(a.identity(), b.identity());
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn test_non_object_record_has_no_fields() {
        let record = MessageRecord::new(json!("just a string"));
        assert!(record.text().is_none());
        assert!(record.sender().is_none());
        assert_eq!(record.identity(), record.identity());
    }

    #[test]
    fn test_first_truthy_skips_empty_values() {
        let record = MessageRecord::new(json!({"text": "", "message": null, "body": "fallback"}));
        assert_eq!(record.text().as_deref(), Some("fallback"));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!(1.5)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!([0])));
    }
}
