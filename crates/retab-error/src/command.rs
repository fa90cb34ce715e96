//! Command-facing helpers: error formatting for dispatchers and the
//! "already printed" marker.
//!
//! A command that reports its own failure wraps the error with
//! [`mark_handled`]; the top-level dispatcher checks [`is_already_handled`]
//! and only sets the exit code instead of printing a second time.

use std::fmt;
use std::io;

use crate::chain::{DynError, extract};
use crate::color::{Colorize, Role};
use crate::error::{BoxError, Error};
use crate::render::{self, RenderOptions};
use crate::sink::RenderError;

/// Marks an error as already reported to the user.
///
/// Displays exactly like the wrapped error and exposes it as its source, so
/// chain queries see straight through it.
#[derive(Debug)]
pub struct Handled {
    inner: BoxError,
}

impl Handled {
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.inner.as_ref()
    }
}

impl fmt::Display for Handled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for Handled {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Wrap `err` in a [`Handled`] marker. Marking twice is a no-op.
pub fn mark_handled(err: impl Into<BoxError>) -> BoxError {
    let err = err.into();
    if is_already_handled(&*err) {
        return err;
    }
    Box::new(Handled { inner: err })
}

/// Whether any link of the chain carries the [`Handled`] marker.
pub fn is_already_handled(err: &DynError) -> bool {
    extract::<Handled>(err).is_some()
}

/// `ERROR - [root sub] - <inline form>`
///
/// The last segment of the command path is highlighted.
pub fn format_command_error(command_path: &[&str], err: &DynError, c: &dyn Colorize) -> String {
    let body = match err.downcast_ref::<Error>() {
        Some(record) => render::inline(record, c),
        None => err.to_string(),
    };
    format!(
        "{} - {}{}",
        c.paint(Role::Heading, "ERROR"),
        command_name(command_path, c),
        c.paint(Role::Failure, &body)
    )
}

/// Verbose variant: compact chain on the first line, then the detailed form.
pub fn format_command_error_verbose(
    command_path: &[&str],
    err: &DynError,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let c = options.colors();
    let summary = match err.downcast_ref::<Error>() {
        Some(record) => record.compact(),
        None => err.to_string(),
    };
    let detailed = render::detailed(err, options)?;
    Ok(format!(
        "{} - {}{}{}",
        c.paint(Role::Heading, "ERROR"),
        command_name(command_path, c),
        c.paint(Role::Failure, &summary),
        detailed.trim_end()
    ))
}

fn command_name(command_path: &[&str], c: &dyn Colorize) -> String {
    let Some((last, parents)) = command_path.split_last() else {
        return String::new();
    };
    let mut segments: Vec<String> = parents
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    segments.push(c.paint(Role::Command, last));
    format!("[{}] - ", segments.join(" "))
}

/// Print the command error to `out` and return the error marked as handled.
pub fn handle_by_printing<W: io::Write>(
    out: &mut W,
    command_path: &[&str],
    err: impl Into<BoxError>,
    c: &dyn Colorize,
) -> io::Result<BoxError> {
    let err = err.into();
    writeln!(out, "{}", format_command_error(command_path, &*err, c))?;
    Ok(mark_handled(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Plain;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mark_handled_is_idempotent() {
        let err = mark_handled(Error::new("boom"));
        assert!(is_already_handled(&*err));

        let twice = mark_handled(err);
        assert!(is_already_handled(&*twice));
        let handled = twice.downcast_ref::<Handled>().unwrap();
        assert!(!handled.inner().is::<Handled>());
    }

    #[test]
    fn test_unhandled_error() {
        let err = Error::new("boom");
        assert!(!is_already_handled(&err));
    }

    #[test]
    fn test_handled_displays_inner() {
        let err = Error::new("boom").with_frame(crate::Frame::default());
        let handled = mark_handled(err);
        assert_eq!(handled.to_string(), "❌ boom");
    }

    #[test]
    fn test_handled_buried_in_chain() {
        let err = Error::wrap(mark_handled(Error::new("inner")), "outer");
        assert!(is_already_handled(&err));
    }

    #[test]
    fn test_format_command_error() {
        let err = Error::new("boom").with_frame(crate::Frame::default());
        assert_eq!(
            format_command_error(&["retab", "check"], &err, &Plain),
            "ERROR - [retab check] - ❌ boom"
        );
        assert_eq!(
            format_command_error(&[], &std::io::Error::other("io"), &Plain),
            "ERROR - io"
        );
    }

    #[test]
    fn test_format_command_error_verbose() {
        let err = Error::wrap(Error::new("open file"), "load config");
        let out = format_command_error_verbose(&["retab"], &err, &RenderOptions::default()).unwrap();
        assert!(out.starts_with("ERROR - [retab] - load config 👉 open file\n\n👇 load config"));
        assert!(out.contains("❌ open file"));
    }

    #[test]
    fn test_handle_by_printing() {
        let mut out = Vec::new();
        let err = Error::new("boom").with_frame(crate::Frame::default());
        let handled = handle_by_printing(&mut out, &["retab", "fmt"], err, &Plain).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ERROR - [retab fmt] - ❌ boom\n");
        assert!(is_already_handled(&*handled));
    }
}
