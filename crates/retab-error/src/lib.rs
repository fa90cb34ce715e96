//! # retab-error
//!
//! Call-site aware error chains for the retab toolchain.
//!
//! ## Design Philosophy
//!
//! - **Error**: one link of a chain; knows where it was built, what went
//!   wrong, and optionally what caused it
//! - **Chain**: any `std::error::Error` followed through `source()`, so
//!   foreign errors participate without adapters
//! - **Detail**: fields are attached as structured values and only rendered
//!   when someone asks
//! - **Recovery**: a link can suggest what the caller might do next
//!
//! ## Usage
//!
//! ```rust
//! use retab_error::{Error, ErrorKind, first_with_kind};
//!
//! fn open() -> Result<(), Error> {
//!     Err(Error::new("open file").with_kind(ErrorKind::NotFound))
//! }
//!
//! fn load() -> Result<(), Error> {
//!     open().map_err(|e| Error::wrap(e, "load config").with("path", "retab.toml"))
//! }
//!
//! let err = load().unwrap_err();
//! assert_eq!(err.compact(), "load config 👉 open file");
//! assert!(first_with_kind(&err, ErrorKind::NotFound).is_some());
//! ```
//!
//! ## Principles
//!
//! - Building an error never fails and never logs
//! - Enrich with `with_*` while you own the error; after that it is read-only
//! - Absence of a kind or hint is `None`, not an error

mod chain;
mod color;
mod command;
mod detail;
mod error;
mod frame;
mod kind;
mod render;
mod sink;

pub use chain::{
    DynError, MAX_CHAIN_DEPTH, RECOVERY_SEPARATOR, RecoveryInfo, chain_of, deepest,
    deepest_of_kind, deepest_record, deepest_with_kind, extract, first_of_kind, first_record,
    first_with_kind, is_recoverable, list_records, recovery,
};
pub use color::{
    Ansi, Colorize, Plain, Role, color_brackets, color_code, colors, format_caller,
    format_location,
};
pub use command::{
    Handled, format_command_error, format_command_error_verbose, handle_by_printing,
    is_already_handled, mark_handled,
};
pub use detail::{IGNORED_KEYS, PRIORITY_KEYS, format_json_for_detail, render_detail};
pub use error::{BoxError, Enrichment, Error, EventFn, Recovery, RecoveryState};
pub use frame::{Frame, Location, file_name_of_path, package_of_file, split_function_path};
pub use kind::ErrorKind;
pub use render::{
    ARROW, DOWN_ARROW, FAILURE_MARK, RenderOptions, compact, detailed, extract_detail, inline,
    link_text, self_line,
};
pub use sink::{EventSink, JsonEventSink, RenderError};

/// Result type alias using retab Error
pub type Result<T> = std::result::Result<T, Error>;

/// Build an [`Error`] from a format string, recording the enclosing function.
///
/// ```rust
/// let err = retab_error::err!("bad value {}", 3);
/// assert_eq!(err.message(), "bad value 3");
/// ```
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::new(::std::format!($($arg)*)).with_frame($crate::frame!())
    };
}

/// Wrap a cause with a formatted message, recording the enclosing function.
///
/// ```rust
/// let io = std::io::Error::other("denied");
/// let err = retab_error::wrapf!(io, "write {}", "out.hcl");
/// assert_eq!(err.compact(), "write out.hcl 👉 denied");
/// ```
#[macro_export]
macro_rules! wrapf {
    ($cause:expr, $($arg:tt)*) => {
        $crate::Error::wrap($cause, ::std::format!($($arg)*)).with_frame($crate::frame!())
    };
}
