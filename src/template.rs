//! Placeholder substitution for step templates
//!
//! A placeholder is a non-greedy `{{ ... }}` token whose trimmed contents
//! name a dotted property path into a data source (usually an action
//! response). Only string and number values may be substituted; anything
//! else, including a missing value, fails the whole resolution.
//!
//! Resolution walks the template's JSON tree and rewrites each string value
//! in place, so substituted text is never re-scanned for placeholders and
//! cannot collide with tokens elsewhere in the template. Object keys are not
//! templated.

mod path;

#[cfg(test)]
mod proptests;

pub use path::lookup;

use path::type_name;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Number, Value};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    /// Placeholder resolved to something other than a string or number
    #[error("Placeholder {placeholder} resolved to unsupported type {found}")]
    UnsupportedType {
        placeholder: String,
        found: &'static str,
    },
    #[error("Template could not be converted to JSON: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Resolved template no longer matches its type: {0}")]
    Shape(#[source] serde_json::Error),
}

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder_pattern() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(.*?)\}\}").expect("placeholder pattern is valid"))
}

/// Whether `text` contains at least one placeholder
pub fn has_placeholders(text: &str) -> bool {
    placeholder_pattern().is_match(text)
}

/// Resolve every placeholder inside `template` against `source`.
///
/// The template is converted to JSON, resolved, and converted back into `T`.
/// A template without placeholders comes back structurally equal.
pub fn resolve<T>(source: &Value, template: &T) -> Result<T, TemplateError>
where
    T: Serialize + DeserializeOwned,
{
    let tree = serde_json::to_value(template).map_err(TemplateError::Serialize)?;
    let resolved = resolve_value(source, tree)?;
    serde_json::from_value(resolved).map_err(TemplateError::Shape)
}

/// Resolve placeholders in every string of a JSON tree
pub fn resolve_value(source: &Value, template: Value) -> Result<Value, TemplateError> {
    match template {
        Value::String(text) => resolve_str(source, &text).map(Value::String),
        Value::Array(items) => items
            .into_iter()
            .map(|item| resolve_value(source, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| resolve_value(source, value).map(|v| (key, v)))
            .collect::<Result<serde_json::Map<_, _>, _>>()
            .map(Value::Object),
        other => Ok(other),
    }
}

/// Resolve placeholders in a single string, left to right
pub fn resolve_str(source: &Value, text: &str) -> Result<String, TemplateError> {
    let pattern = placeholder_pattern();
    if !pattern.is_match(text) {
        return Ok(text.to_string());
    }

    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for captures in pattern.captures_iter(text) {
        let (Some(token), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        output.push_str(text.get(last..token.start()).unwrap_or_default());
        output.push_str(&render(source, token.as_str(), inner.as_str())?);
        last = token.end();
    }
    output.push_str(text.get(last..).unwrap_or_default());
    Ok(output)
}

fn render(source: &Value, token: &str, path: &str) -> Result<String, TemplateError> {
    match lookup(source, path.trim()) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(format_number(n)),
        other => Err(TemplateError::UnsupportedType {
            placeholder: token.to_string(),
            found: type_name(other),
        }),
    }
}

/// Default decimal form: integers as-is, integral floats without a trailing `.0`
fn format_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) => format_float(f).unwrap_or_else(|| f.to_string()),
        None => n.to_string(),
    }
}

/// Shortest round-trip digits, switching to exponent form below 1e-6 and
/// from 1e21 up (`1e+21`, `1.5e-7`)
fn format_float(f: f64) -> Option<String> {
    let scientific = format!("{:e}", f.abs());
    let (mantissa, exponent) = scientific.split_once('e')?;
    let digits: Vec<char> = mantissa.chars().filter(char::is_ascii_digit).collect();
    let k = i32::try_from(digits.len()).ok()?;
    // Position of the decimal point relative to the first digit
    let n = exponent.parse::<i32>().ok()? + 1;

    let all: String = digits.iter().collect();
    let body = if k <= n && n <= 21 {
        all + &"0".repeat(usize::try_from(n - k).ok()?)
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(usize::try_from(n).ok()?);
        format!("{}.{}", int.iter().collect::<String>(), frac.iter().collect::<String>())
    } else if -6 < n && n <= 0 {
        format!("0.{}{all}", "0".repeat(usize::try_from(-n).ok()?))
    } else {
        let (first, rest) = digits.split_first()?;
        let rest: String = rest.iter().collect();
        let sign = if n > 0 { '+' } else { '-' };
        let exp = (n - 1).abs();
        if rest.is_empty() {
            format!("{first}e{sign}{exp}")
        } else {
            format!("{first}.{rest}e{sign}{exp}")
        }
    };

    Some(if f < 0.0 { format!("-{body}") } else { body })
}
