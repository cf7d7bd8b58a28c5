//! JSON override helpers.
//! 用户自定义 JSON 片段的解析与合并。
//!
//! User-supplied fragments (custom outbound/inbound/route/config) are parsed
//! leniently: empty text is an empty object, malformed text is logged and
//! treated as empty.

use serde_json::{Map, Value};

/// Parse a raw JSON object fragment. Anything that is not an object yields an empty map.
pub fn parse_object(text: &str, what: &str) -> Map<String, Value> {
    let text = text.trim();
    if text.is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(m)) => m,
        Ok(other) => {
            tracing::warn!(field = what, kind = %json_kind(&other), "ignoring non-object JSON");
            Map::new()
        }
        Err(e) => {
            tracing::warn!(field = what, error = %e, "ignoring malformed JSON");
            Map::new()
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deep-merge `custom` into `target`.
///
/// Objects present on both sides merge recursively; any other value from
/// `custom` replaces the target's (arrays included).
pub fn merge_into(target: &mut Map<String, Value>, custom: Map<String, Value>) {
    for (k, v) in custom {
        let Value::Object(v_obj) = v else {
            target.insert(k, v);
            continue;
        };
        if let Some(Value::Object(orig)) = target.get_mut(&k) {
            merge_into(orig, v_obj);
            continue;
        }
        target.insert(k, Value::Object(v_obj));
    }
}
