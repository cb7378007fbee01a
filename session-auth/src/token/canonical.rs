//! Canonical JSON encoding.
//!
//! Token signatures cover the encoded bytes, so every issuer must produce the same
//! bytes for the same claims. Object keys are sorted here explicitly at every level
//! instead of relying on the iteration order of `serde_json::Map`, which changes
//! when the `preserve_order` feature is enabled anywhere in the build.

use serde::Serialize;
use serde_json::Value;

/// Serialize a value to canonical JSON bytes.
///
/// Keys are sorted ascending by their UTF-8 bytes and there is no insignificant
/// whitespace. Output is pure ASCII: every character outside `' '..='~'` in keys
/// and string values is written as `\uXXXX` (lowercase hex, surrogate pairs above
/// U+FFFF), except the short escapes `\"`, `\\`, `\n`, `\r`, `\t`, `\b`, `\f`.
///
/// # Errors
/// * `serde_json::Error` - The value cannot be represented as JSON
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    let mut out = Vec::with_capacity(128);
    write_value(&mut out, &value);
    Ok(out)
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(b) => out.extend_from_slice(if *b { "true" } else { "false" }.as_bytes()),
        Value::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(out, item);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(out, key);
                out.push(b':');
                write_value(out, item);
            }
            out.push(b'}');
        }
    }
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    for c in s.chars() {
        match c {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\u{0c}' => out.extend_from_slice(b"\\f"),
            ' '..='~' => out.push(c as u8),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.extend_from_slice(format!("\\u{:04x}", unit).as_bytes());
                }
            }
        }
    }
    out.push(b'"');
}
