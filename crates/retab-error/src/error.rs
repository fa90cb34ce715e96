//! The error record and its builders.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::ser::{Error as _, SerializeMap, Serializer};
use serde_json::Value;

use crate::frame::Frame;
use crate::render;
use crate::sink::{EventSink, JsonEventSink, RenderError};
use crate::{ErrorKind, RenderOptions};

/// Boxed cause of a record. Any `std::error::Error` can sit in a chain.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Opaque piece of state carried by a recovery hint.
pub type RecoveryState = Arc<dyn Any + Send + Sync>;

/// Deferred field contribution, evaluated against a sink at render time.
pub type EventFn = dyn Fn(&mut dyn EventSink) -> Result<(), RenderError> + Send + Sync;

/// One enrichment step applied to the structured event of a record.
///
/// Enrichments run in the order they were registered, after the built-in
/// fields, so a later one can shadow an earlier key.
pub enum Enrichment {
    /// A named field, marshalled when it was attached.
    Field {
        name: String,
        value: serde_json::Result<Value>,
    },
    /// A closure that writes any number of fields.
    Deferred(Box<EventFn>),
}

impl Enrichment {
    /// Apply this enrichment to `sink`.
    pub fn apply(&self, sink: &mut dyn EventSink) -> Result<(), RenderError> {
        match self {
            Enrichment::Field { name, value } => match value {
                Ok(value) => sink.attach(name, value.clone()),
                Err(err) => Err(RenderError::Marshal(serde_json::Error::custom(format!(
                    "field '{name}': {err}"
                )))),
            },
            Enrichment::Deferred(f) => f(sink),
        }
    }
}

impl fmt::Debug for Enrichment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Enrichment::Field { name, value } => {
                f.debug_struct("Field").field("name", name).field("value", value).finish()
            }
            Enrichment::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// A suggestion for how the caller might recover, plus opaque state.
#[derive(Clone)]
pub struct Recovery {
    suggestion: String,
    state: Vec<RecoveryState>,
}

impl Recovery {
    pub fn new(suggestion: impl Into<String>, state: Vec<RecoveryState>) -> Self {
        Self {
            suggestion: suggestion.into(),
            state,
        }
    }

    pub fn suggestion(&self) -> &str {
        &self.suggestion
    }

    pub fn state(&self) -> &[RecoveryState] {
        &self.state
    }

    /// First piece of state of type `T`.
    pub fn state_of<T: Any>(&self) -> Option<&T> {
        self.state.iter().find_map(|s| s.downcast_ref::<T>())
    }
}

impl fmt::Debug for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recovery")
            .field("suggestion", &self.suggestion)
            .field("state", &self.state.len())
            .finish()
    }
}

/// One link of an error chain.
///
/// A record owns its message, the call site where it was built, an optional
/// cause, and the optional extras below. The `with_*` builders consume and
/// return the record, so enrichment happens while the creator still owns it;
/// once a record is boxed as a cause or borrowed for inspection there is no
/// way to mutate it.
pub struct Error {
    message: String,
    kind: Option<ErrorKind>,
    cause: Option<BoxError>,
    frame: Frame,
    enrichments: Vec<Enrichment>,
    code: i32,
    recovery: Option<Recovery>,
}

impl Error {
    /// Create a new root record at the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            cause: None,
            frame: Frame::caller(),
            enrichments: Vec::new(),
            code: 0,
            recovery: None,
        }
    }

    /// Wrap `cause` with a message at the caller's location.
    #[track_caller]
    pub fn wrap(cause: impl Into<BoxError>, message: impl Into<String>) -> Self {
        let mut err = Self::new(message);
        err.cause = Some(cause.into());
        err
    }

    /// Wrap an optional cause. A `None` cause behaves like [`Error::new`].
    #[track_caller]
    pub fn wrap_opt<E: Into<BoxError>>(cause: Option<E>, message: impl Into<String>) -> Self {
        let mut err = Self::new(message);
        err.cause = cause.map(Into::into);
        err
    }

    /// A `Mismatch` record carrying `expected` and `actual` fields.
    #[track_caller]
    pub fn mismatch<T: Serialize>(expected: T, actual: T) -> Self {
        Self::new("mismatch")
            .with_kind(ErrorKind::Mismatch)
            .with("expected", expected)
            .with("actual", actual)
    }

    /// Create an InvalidArgument error
    #[track_caller]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::InvalidArgument)
    }

    /// Create an Unexpected error
    #[track_caller]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Unexpected)
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error kind, if one was set
    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    /// Get the numeric code; 0 means unset
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Get the captured call site
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Get the recovery hint attached to this link
    pub fn recovery(&self) -> Option<&Recovery> {
        self.recovery.as_ref()
    }

    /// Get the registered enrichments, in order
    pub fn enrichments(&self) -> &[Enrichment] {
        &self.enrichments
    }

    /// Get the direct cause (if any).
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Replace the captured frame, typically with one from `frame!`.
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    /// Tag the record with a kind.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the numeric code. 0 clears it.
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    /// Attach a recovery hint to this link.
    pub fn with_recovery(mut self, suggestion: impl Into<String>, state: Vec<RecoveryState>) -> Self {
        self.recovery = Some(Recovery::new(suggestion, state));
        self
    }

    /// Add a named field to the structured detail.
    pub fn with<T: Serialize>(mut self, name: impl Into<String>, value: T) -> Self {
        self.enrichments.push(Enrichment::Field {
            name: name.into(),
            value: serde_json::to_value(value),
        });
        self
    }

    /// Register a deferred contribution. `f` only runs when the record is
    /// rendered or logged, so expensive fields cost nothing on paths that
    /// drop the error.
    pub fn event<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut dyn EventSink) -> Result<(), RenderError> + Send + Sync + 'static,
    {
        self.enrichments.push(Enrichment::Deferred(Box::new(f)));
        self
    }

    /// Write this link's fields into `sink`: location, message, cause
    /// rendering, code and kind when set, then every enrichment in order.
    pub fn populate(&self, sink: &mut dyn EventSink) -> Result<(), RenderError> {
        let loc = self.frame.location();
        sink.str("package", loc.package.as_str())?;
        sink.str("file", loc.file_line())?;
        sink.str("message", self.message.as_str())?;
        sink.str("function", loc.function.as_str())?;

        if let Some(cause) = &self.cause {
            sink.str("chain", cause.to_string())?;
        }
        if self.code != 0 {
            sink.field("code", &self.code)?;
        }
        if let Some(kind) = self.kind {
            sink.str("kind", kind.as_str())?;
        }

        for enrichment in &self.enrichments {
            enrichment.apply(sink)?;
        }
        Ok(())
    }

    /// Column-aligned structured detail block with default options.
    pub fn detail(&self) -> Result<String, RenderError> {
        self.detail_with(&mut JsonEventSink::new(), &RenderOptions::default())
    }

    /// Structured detail block through an explicit sink and options.
    pub fn detail_with(
        &self,
        sink: &mut dyn EventSink,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        crate::detail::render_detail(self, sink, options)
    }

    /// Location-free single line: `load config 👉 open file`.
    pub fn compact(&self) -> String {
        render::compact(self)
    }

    /// Multi-line rendering of the whole chain with detail blocks.
    pub fn detailed(&self) -> Result<String, RenderError> {
        render::detailed(self, &RenderOptions::default())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::inline(self, &crate::color::Plain))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} at {:?}", self.message, self.frame)?;

        if let Some(kind) = self.kind {
            writeln!(f, "    Kind: {kind}")?;
        }
        if self.code != 0 {
            writeln!(f, "    Code: {}", self.code)?;
        }
        if let Some(recovery) = &self.recovery {
            writeln!(f, "    Recovery: {}", recovery.suggestion)?;
        }
        if let Some(cause) = &self.cause {
            writeln!(f)?;
            writeln!(f, "    Cause: {:?}", cause)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut sink = JsonEventSink::new();
        self.populate(&mut sink).map_err(S::Error::custom)?;

        let fields = sink.into_fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl From<std::io::Error> for Error {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        let kind = ErrorKind::from(err.kind());
        Error::wrap(err, "io operation failed").with_kind(kind)
    }
}

impl From<String> for Error {
    #[track_caller]
    fn from(msg: String) -> Self {
        Error::unexpected(msg)
    }
}

impl From<&str> for Error {
    #[track_caller]
    fn from(msg: &str) -> Self {
        Error::unexpected(msg)
    }
}
