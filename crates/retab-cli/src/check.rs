//! `retab check`: verify that input files are readable, non-empty UTF-8.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use retab_error::{BoxError, ErrorKind, RecoveryState, Result, err, wrapf};

use crate::dispatch::Dispatcher;

pub const COMMAND_PATH: &[&str] = &["retab", "check"];

/// What a successful check learned about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub bytes: usize,
    pub lines: usize,
}

/// Check one file.
pub fn check_file(path: &Path) -> Result<FileReport> {
    let shown = path.display().to_string();

    let bytes = fs::read(path).map_err(|io| {
        let kind = ErrorKind::from(io.kind());
        let err = wrapf!(io, "read {shown}")
            .with_kind(kind)
            .with("path", &shown);
        if kind == ErrorKind::NotFound {
            err.with_recovery(
                "check the path, or create the file first",
                vec![Arc::new(path.to_path_buf()) as RecoveryState],
            )
        } else {
            err
        }
    })?;

    if bytes.is_empty() {
        return Err(err!("{shown} is empty")
            .with_kind(ErrorKind::InvalidArgument)
            .with("path", &shown));
    }

    let size = bytes.len();
    let text = String::from_utf8(bytes).map_err(|utf8| {
        let offset = utf8.utf8_error().valid_up_to();
        let prefix: Arc<[u8]> = Arc::from(&utf8.as_bytes()[..offset]);
        wrapf!(utf8, "decode {shown}")
            .with_kind(ErrorKind::Encoding)
            .with("path", &shown)
            .with("offset", offset)
            .event(move |sink| {
                let line = prefix.iter().filter(|b| **b == b'\n').count() + 1;
                sink.field("line", &line)
            })
    })?;

    Ok(FileReport {
        path: path.to_path_buf(),
        bytes: size,
        lines: text.lines().count(),
    })
}

/// Check every file, reporting each failure through `dispatcher` to `err_out`.
///
/// Keeps going after a failure; the first failure is returned, already
/// marked as handled.
pub fn run<O: Write, E: Write>(
    dispatcher: &Dispatcher,
    files: &[PathBuf],
    out: &mut O,
    err_out: &mut E,
) -> std::result::Result<(), BoxError> {
    let mut first_failure: Option<BoxError> = None;
    let mut failed = 0usize;

    for path in files {
        match check_file(path) {
            Ok(report) => {
                tracing::debug!(path = %report.path.display(), lines = report.lines, "checked");
                writeln!(
                    out,
                    "ok {} ({} lines, {} bytes)",
                    report.path.display(),
                    report.lines,
                    report.bytes
                )
                .map_err(|io| wrapf!(io, "write report"))?;
            }
            Err(err) => {
                failed += 1;
                tracing::debug!(path = %path.display(), error = %err.compact(), "check failed");
                let reported = dispatcher.report(COMMAND_PATH, Box::new(err), err_out);
                first_failure.get_or_insert(reported);
            }
        }
    }

    tracing::info!(total = files.len(), failed, "check complete");
    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use retab_error::{first_with_kind, is_recoverable, recovery};

    #[test]
    fn test_check_file_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.tf");
        fs::write(&path, "a\nb\n").unwrap();

        let report = check_file(&path).unwrap();
        assert_eq!(report.lines, 2);
        assert_eq!(report.bytes, 4);
    }

    #[test]
    fn test_missing_file_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.tf");

        let err = check_file(&path).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert!(is_recoverable(&err));
        let info = recovery(&err).unwrap();
        assert_eq!(info.state[0].downcast_ref::<PathBuf>(), Some(&path));
        assert!(err.frame().location().function.contains("check_file"));
    }

    #[test]
    fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.tf");
        fs::write(&path, "").unwrap();

        let err = check_file(&path).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidArgument));
        assert!(err.message().ends_with("is empty"));
    }

    #[test]
    fn test_invalid_utf8_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.tf");
        fs::write(&path, b"ok\nstill ok\n\xff").unwrap();

        let err = check_file(&path).unwrap_err();
        assert!(first_with_kind(&err, ErrorKind::Encoding).is_some());
        let detail = err.detail().unwrap();
        assert!(detail.lines().any(|l| l.starts_with("line") && l.ends_with("= 3")));
        assert!(detail.lines().any(|l| l.starts_with("offset") && l.ends_with("= 12")));
    }

    #[test]
    fn test_run_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.tf");
        fs::write(&good, "x\n").unwrap();
        let missing = dir.path().join("missing.tf");

        let mut out = Vec::new();
        let mut err_out = Vec::new();
        let result = run(
            &Dispatcher::new(false, false),
            &[missing, good],
            &mut out,
            &mut err_out,
        );

        let err = result.unwrap_err();
        assert!(retab_error::is_already_handled(&*err));
        assert_eq!(crate::dispatch::exit_code(&*err), 3);

        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("ok "));
        let err_out = String::from_utf8(err_out).unwrap();
        assert!(err_out.starts_with("ERROR - [retab check] - read "));
        assert_eq!(err_out.lines().count(), 1);
    }
}
