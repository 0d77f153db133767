use serde_json::{Map, Value};

/// Replacement written in place of sensitive values.
pub const REDACTED_MARKER: &str = "[REDACTED]";

/// Largest serialized payload kept in an audit record.
pub const REDACTION_SIZE_LIMIT: usize = 5000;

/// Normalized fragments that mark a field name as sensitive.
const SENSITIVE_FRAGMENTS: &[&str] = &[
    "password",
    "senha",
    "token",
    "secret",
    "apikey",
    "creditcard",
    "cvv",
    "cardnumber",
];

fn is_sensitive_key(key: &str) -> bool {
    let normalized: String = key
        .chars()
        .filter(|character| *character != '_' && *character != '-')
        .flat_map(char::to_lowercase)
        .collect();

    SENSITIVE_FRAGMENTS
        .iter()
        .any(|fragment| normalized.contains(fragment))
}

/// Replaces the values of sensitive fields recursively.
#[must_use]
pub fn redact_sensitive(value: &Value) -> Value {
    match value {
        Value::Object(fields) => {
            let redacted: Map<String, Value> = fields
                .iter()
                .map(|(key, field)| {
                    let field = if is_sensitive_key(key) {
                        Value::String(REDACTED_MARKER.to_owned())
                    } else {
                        redact_sensitive(field)
                    };
                    (key.clone(), field)
                })
                .collect();
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive).collect()),
        other => other.clone(),
    }
}

/// Redacts a payload and replaces it with a size marker when it is too large.
///
/// Oversized payloads never keep partial content.
#[must_use]
pub fn summarize_payload(value: &Value, size_limit: usize) -> Value {
    let redacted = redact_sensitive(value);
    let size = redacted.to_string().len();
    if size > size_limit {
        return serde_json::json!({ "_truncated": true, "_size": size });
    }

    redacted
}
