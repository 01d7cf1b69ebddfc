//! Dotted property paths (`user.orders[0].id`) and lookup into JSON values

use serde_json::Value;

/// Split a property path into its segments.
///
/// Dots separate segments and `[n]` is shorthand for `.n`, so
/// `items[0].name` and `items.0.name` are the same path. Empty segments are
/// dropped.
pub fn parse_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for c in path.chars() {
        match c {
            '.' | '[' | ']' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Walk `source` along `path`; `None` when any segment is missing
pub fn lookup<'a>(source: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = parse_path(path);
    if segments.is_empty() {
        return None;
    }

    segments
        .iter()
        .try_fold(source, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Name of a value's type as reported in template errors
pub fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}
