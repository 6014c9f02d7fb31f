use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// `key[index]` as a whole segment
static INDEXED_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_]+)\[([0-9]+)\]$").unwrap());

/// Resolve a dotted path expression against a JSON tree.
///
/// Each `.`-separated segment is either a plain key or `key[index]`, which
/// looks up `key` and then indexes the result. Walking stops at the first
/// segment that does not resolve and the whole expression is `None`;
/// missing keys, type mismatches and out-of-range indices are not errors.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use peekaboo_mapper::extract_value;
///
/// let node = json!({"a": {"b": [10, 20]}});
/// assert_eq!(extract_value(&node, "a.b[1]"), Some(&json!(20)));
/// assert_eq!(extract_value(&node, "a.b[5]"), None);
/// ```
pub fn extract_value<'a>(node: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(node, |current, segment| {
        match INDEXED_SEGMENT_RE.captures(segment) {
            Some(caps) => lookup(current, &caps[1]).and_then(|inner| lookup(inner, &caps[2])),
            None => lookup(current, segment),
        }
    })
}

/// One lookup step. Objects are keyed by name, arrays by decimal position.
/// Scalars and `null` have no children.
fn lookup<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
