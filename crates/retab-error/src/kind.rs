//! Error kinds for retab operations

use strum_macros::{Display, IntoStaticStr};

/// The kind of failure a record describes.
///
/// Kinds are an optional tag: a record built with [`Error::new`] has none.
/// Callers match on the kind to pick an exit code or to find the most
/// relevant link in a chain (see [`first_with_kind`]).
///
/// [`Error::new`]: crate::Error::new
/// [`first_with_kind`]: crate::first_with_kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested feature or operation is not supported
    Unsupported,

    /// Invalid command line usage
    Usage,

    /// Invalid argument passed to an operation
    InvalidArgument,

    /// Invalid configuration or parameters
    ConfigInvalid,

    // =========================================================================
    // File/IO errors
    // =========================================================================
    /// File or resource not found
    NotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    Io,

    // =========================================================================
    // Content errors
    // =========================================================================
    /// Encoding error (invalid UTF-8, etc.)
    Encoding,

    /// Failed to parse input
    ParseFailed,

    /// Expected and actual values differ
    Mismatch,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Process exit code used when a failure of this kind ends a command.
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorKind::Unexpected | ErrorKind::Unsupported => 1,
            ErrorKind::Usage | ErrorKind::InvalidArgument | ErrorKind::ConfigInvalid => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::PermissionDenied => 6,
            ErrorKind::Encoding | ErrorKind::ParseFailed | ErrorKind::Mismatch => 7,
            ErrorKind::Io => 8,
        }
    }
}

impl From<std::io::ErrorKind> for ErrorKind {
    fn from(kind: std::io::ErrorKind) -> Self {
        match kind {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            std::io::ErrorKind::InvalidData => ErrorKind::Encoding,
            std::io::ErrorKind::InvalidInput => ErrorKind::InvalidArgument,
            _ => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::ParseFailed.to_string(), "ParseFailed");
        assert_eq!(ErrorKind::NotFound.as_str(), "NotFound");
    }

    #[test]
    fn test_exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Unexpected, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::NotFound, 3),
            (ErrorKind::PermissionDenied, 6),
            (ErrorKind::Encoding, 7),
            (ErrorKind::Io, 8),
        ];
        for (kind, code) in cases {
            assert_eq!(kind.exit_code(), code, "{kind}");
        }
    }

    #[test]
    fn test_from_io_kind() {
        assert_eq!(
            ErrorKind::from(std::io::ErrorKind::NotFound),
            ErrorKind::NotFound
        );
        assert_eq!(
            ErrorKind::from(std::io::ErrorKind::InvalidData),
            ErrorKind::Encoding
        );
        assert_eq!(ErrorKind::from(std::io::ErrorKind::Interrupted), ErrorKind::Io);
    }
}
