//! Canonical serialization (the exact text that gets signed).
//!
//! Rules:
//! - mapping: keys in code-point order, each emitted as `key ++ value`
//! - sequence: elements concatenated in their original order
//! - null: empty string (the owning key is still emitted)
//! - bool: `true` / `false`
//! - number / string: verbatim text, numbers are never reformatted
//!
//! Absent keys contribute nothing because they are simply not in the map.
//!
//! A parsed `Value` cannot carry number text exactly (`1e3` comes back as
//! `1e+3`, `-0` as `0`), so inbound data is serialized from its raw text with
//! [`serialize_raw`]. [`serialize_node`] is for trees built locally.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::Result;

/// Serialize a locally built tree.
pub fn serialize_node(node: &Value) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

/// Serialize a typed value by first converting it into a node.
///
/// Field presence follows the type's serde attributes: an `Option` without
/// `skip_serializing_if` becomes a present-but-null key.
pub fn serialize_data<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    let node = serde_json::to_value(data)?;
    Ok(serialize_node(&node))
}

/// Serialize raw JSON text. Use this for anything received over the network:
/// number and boolean lexemes are copied as they appear.
pub fn serialize_raw(raw: &RawValue) -> Result<String> {
    let mut out = String::new();
    write_raw(raw, &mut out)?;
    Ok(out)
}

fn write_raw(raw: &RawValue, out: &mut String) -> Result<()> {
    let text = raw.get().trim();
    match text.as_bytes().first() {
        Some(b'{') => {
            // String ordering is byte-wise on UTF-8, same as `write_node`.
            let map: BTreeMap<String, &RawValue> = serde_json::from_str(text)?;
            for (key, value) in map {
                out.push_str(&key);
                write_raw(value, out)?;
            }
        }
        Some(b'[') => {
            let items: Vec<&RawValue> = serde_json::from_str(text)?;
            for item in items {
                write_raw(item, out)?;
            }
        }
        Some(b'"') => {
            let s: String = serde_json::from_str(text)?;
            out.push_str(&s);
        }
        Some(b'n') => {}
        _ => out.push_str(text),
    }
    Ok(())
}

fn write_node(node: &Value, out: &mut String) {
    match node {
        Value::Null => {}
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(s),
        Value::Array(items) => {
            for item in items {
                write_node(item, out);
            }
        }
        Value::Object(map) => {
            // str ordering is byte-wise on UTF-8, which is code-point order.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            for key in keys {
                out.push_str(key);
                if let Some(v) = map.get(key) {
                    write_node(v, out);
                }
            }
        }
    }
}
