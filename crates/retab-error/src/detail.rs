//! Structured detail block.
//!
//! A record writes its fields into an event sink, the sink emits a JSON
//! object, and this module flattens that object into aligned rows:
//!
//! ```text
//! chain    = ❌ open file[pkg=config][file=load.rs:12]
//! file     = load.rs:14
//! function = load
//! message  = load config
//! package  = config
//! attempt  = 2
//! ```
//!
//! Priority keys come first, then every other key, each group sorted
//! alphabetically. Ignored keys are dropped.

use serde_json::{Map, Value};

use crate::error::Error;
use crate::render::RenderOptions;
use crate::sink::{EventSink, RenderError};

/// Keys rendered ahead of all others.
pub const PRIORITY_KEYS: &[&str] = &["package", "file", "message", "function", "chain"];

/// Keys that belong to the logging envelope rather than the error.
pub const IGNORED_KEYS: &[&str] = &["level", "error", "caller"];

/// Render the detail block of a single record through `sink`.
pub fn render_detail(
    err: &Error,
    sink: &mut dyn EventSink,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    err.populate(sink)?;
    let event = sink.emit()?;
    format_json_for_detail(&event, &options.ignored_keys, &options.priority_keys)
}

/// Flatten a serialized event into aligned `key = value` rows.
///
/// Rows are separated by a newline; there is none after the last row.
pub fn format_json_for_detail<S: AsRef<str>>(
    event: &[u8],
    ignored: &[S],
    priority: &[S],
) -> Result<String, RenderError> {
    let root: Map<String, Value> = serde_json::from_slice(event)?;

    let mut rows = Vec::new();
    flatten("", &root, &mut rows);

    rows.retain(|(key, _)| !contains(ignored, key.as_str()));

    let (mut first, mut rest): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|(key, _)| contains(priority, key.as_str()));
    first.sort_by(|a, b| a.0.cmp(&b.0));
    rest.sort_by(|a, b| a.0.cmp(&b.0));
    first.extend(rest);

    Ok(align(&first))
}

fn contains<S: AsRef<str>>(keys: &[S], key: &str) -> bool {
    keys.iter().any(|k| k.as_ref() == key)
}

fn flatten(prefix: &str, object: &Map<String, Value>, rows: &mut Vec<(String, String)>) {
    for (key, value) in object {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten(&key, inner, rows),
            _ => rows.push((key, display_value(value))),
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "nil".to_string(),
        Value::String(s) if s.is_empty() => "\"\"".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn align(rows: &[(String, String)]) -> String {
    let width = rows
        .iter()
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);

    rows.iter()
        .map(|(key, value)| format!("{key:<width$} = {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
