//! Structured event sinks.
//!
//! A record never formats its own detail block directly. It attaches typed
//! key/value pairs to an [`EventSink`], and the sink's `emit` step produces
//! the serialized event that the detail renderer flattens. Any sink that
//! accepts JSON-like values works; [`JsonEventSink`] is the default.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Failure while turning a record into structured output.
#[derive(Debug)]
pub enum RenderError {
    /// A field value could not be marshalled.
    Marshal(serde_json::Error),
    /// The sink rejected a field or failed to emit.
    Sink(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Marshal(err) => write!(f, "failed to marshal error field: {err}"),
            RenderError::Sink(msg) => write!(f, "event sink failed: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Marshal(err) => Some(err),
            RenderError::Sink(_) => None,
        }
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Marshal(err)
    }
}

/// Destination for the key/value fields of a record.
pub trait EventSink {
    /// Attach one field. Later fields with the same key replace earlier ones.
    fn attach(&mut self, key: &str, value: Value) -> Result<(), RenderError>;

    /// Finish the event and return its serialized JSON object.
    fn emit(&mut self) -> Result<Vec<u8>, RenderError>;
}

impl dyn EventSink + '_ {
    /// Serialize `value` and attach it under `key`.
    pub fn field<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), RenderError> {
        let value = serde_json::to_value(value)?;
        self.attach(key, value)
    }

    /// Attach a string field.
    pub fn str(&mut self, key: &str, value: impl Into<String>) -> Result<(), RenderError> {
        self.attach(key, Value::String(value.into()))
    }
}

/// Sink that collects fields into a JSON object.
#[derive(Debug, Default, Clone)]
pub struct JsonEventSink {
    fields: Map<String, Value>,
}

impl JsonEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl EventSink for JsonEventSink {
    fn attach(&mut self, key: &str, value: Value) -> Result<(), RenderError> {
        self.fields.insert(key.to_string(), value);
        Ok(())
    }

    fn emit(&mut self) -> Result<Vec<u8>, RenderError> {
        let event = std::mem::take(&mut self.fields);
        Ok(serde_json::to_vec(&event)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_sink_emits_object() {
        let mut sink = JsonEventSink::new();
        {
            let sink: &mut dyn EventSink = &mut sink;
            sink.str("message", "boom").unwrap();
            sink.field("count", &3).unwrap();
        }
        let bytes = sink.emit().unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"message": "boom", "count": 3}));
        assert!(sink.fields().is_empty());
    }

    #[test]
    fn test_later_field_replaces_earlier() {
        let mut sink = JsonEventSink::new();
        sink.attach("a", json!(1)).unwrap();
        sink.attach("a", json!(2)).unwrap();
        assert_eq!(sink.fields().get("a"), Some(&json!(2)));
    }

    #[test]
    fn test_marshal_failure_is_reported() {
        use std::collections::BTreeMap;

        let mut bad = BTreeMap::new();
        bad.insert((1, 2), "tuple keys are not valid JSON object keys");

        let mut sink = JsonEventSink::new();
        let sink: &mut dyn EventSink = &mut sink;
        let err = sink.field("bad", &bad).unwrap_err();
        assert!(matches!(err, RenderError::Marshal(_)));
        assert!(err.to_string().contains("marshal"));
    }
}
