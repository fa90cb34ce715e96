//! Top-level failure reporting for retab subcommands.

use std::io::Write;

use retab_error::{
    BoxError, DynError, ErrorKind, RenderOptions, chain_of, first_record, format_command_error,
    format_command_error_verbose, is_already_handled, mark_handled,
};

use crate::options::GlobalOptions;

/// Prints command failures once and turns them into process exit codes.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    verbose: bool,
    render: RenderOptions,
}

impl Dispatcher {
    pub fn new(verbose: bool, color: bool) -> Self {
        Self {
            verbose,
            render: RenderOptions::new().with_color(color),
        }
    }

    pub fn from_options(opts: &GlobalOptions, is_tty: bool) -> Self {
        Self::new(opts.verbose, opts.color.use_color(is_tty))
    }

    /// Format `err` the way this dispatcher prints it, without a trailing newline.
    pub fn format(&self, command_path: &[&str], err: &DynError) -> String {
        if self.verbose {
            match format_command_error_verbose(command_path, err, &self.render) {
                Ok(text) => return text,
                Err(render_err) => {
                    tracing::warn!(error = %render_err, "detailed rendering failed");
                }
            }
        }
        format_command_error(command_path, err, self.render.colors())
    }

    /// Print `err` to `out` and mark it handled.
    ///
    /// If the write fails the error comes back unmarked so the final
    /// [`Dispatcher::finish`] still gets a chance to report it.
    pub fn report<W: Write>(&self, command_path: &[&str], err: BoxError, out: &mut W) -> BoxError {
        if is_already_handled(&*err) {
            return err;
        }
        let text = self.format(command_path, &*err);
        match writeln!(out, "{text}") {
            Ok(()) => mark_handled(err),
            Err(io) => {
                tracing::warn!(error = %io, "failed to report command error");
                err
            }
        }
    }

    /// Finish a command: print its error unless already printed, log it, and
    /// return the exit code.
    pub fn finish<W: Write>(
        &self,
        command_path: &[&str],
        result: Result<(), BoxError>,
        out: &mut W,
    ) -> u8 {
        let err = match result {
            Ok(()) => return 0,
            Err(err) => err,
        };

        let code = exit_code(&*err);
        let detail = record_detail(&*err);
        tracing::error!(
            error = &*err as &(dyn std::error::Error + 'static),
            code,
            detail = detail.as_deref(),
            "command failed"
        );

        if !is_already_handled(&*err) {
            let _ = writeln!(out, "{}", self.format(command_path, &*err));
        }
        code
    }
}

/// The first record of the chain as JSON, for the failure log event.
///
/// `None` when the chain holds no record or the record fails to serialize;
/// the latter is logged.
pub fn record_detail(err: &DynError) -> Option<String> {
    let record = first_record(err)?;
    match serde_json::to_string(record) {
        Ok(detail) => Some(detail),
        Err(marshal) => {
            tracing::warn!(error = %marshal, "failed to serialize error detail");
            None
        }
    }
}

/// Exit code for a failed command.
///
/// The outermost explicit code in `1..=255` wins, then the outermost kind,
/// otherwise `1`.
pub fn exit_code(err: &DynError) -> u8 {
    let records: Vec<_> = chain_of(err)
        .into_iter()
        .filter_map(|link| link.downcast_ref::<retab_error::Error>())
        .collect();

    if let Some(code) = records
        .iter()
        .map(|r| r.code())
        .find(|code| (1..=255).contains(code))
    {
        return code as u8;
    }
    records
        .iter()
        .find_map(|r| r.kind())
        .map(|kind| kind.exit_code())
        .unwrap_or(ErrorKind::Unexpected.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use retab_error::{Error, Frame};
    use std::collections::BTreeMap;

    fn plain() -> Dispatcher {
        Dispatcher::new(false, false)
    }

    #[test]
    fn test_exit_code_prefers_code() {
        let err = Error::wrap(
            Error::new("inner").with_kind(ErrorKind::NotFound),
            "outer",
        )
        .with_code(42);
        assert_eq!(exit_code(&err), 42);
    }

    #[test]
    fn test_exit_code_from_kind() {
        let err = Error::wrap(Error::new("inner").with_kind(ErrorKind::NotFound), "outer");
        assert_eq!(exit_code(&err), 3);
    }

    #[test]
    fn test_exit_code_default() {
        assert_eq!(exit_code(&Error::new("boom")), 1);
        assert_eq!(exit_code(&Error::new("boom").with_code(1000)), 1);
        assert_eq!(exit_code(&std::io::Error::other("io")), 1);
    }

    #[test]
    fn test_record_detail() {
        let err = Error::wrap(Error::new("inner").with("path", "a.tf"), "outer");
        let detail: serde_json::Value =
            serde_json::from_str(&record_detail(&err).unwrap()).unwrap();
        assert_eq!(detail["message"], "outer");

        assert_eq!(record_detail(&std::io::Error::other("io")), None);
    }

    #[test]
    fn test_record_detail_marshal_failure() {
        let keys: BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        let err = Error::new("bad field").with("keys", keys);
        assert_eq!(record_detail(&err), None);
    }

    #[test]
    fn test_finish_ok() {
        let mut out = Vec::new();
        assert_eq!(plain().finish(&["retab"], Ok(()), &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_finish_prints_once() {
        let d = plain();
        let mut out = Vec::new();
        let err = Error::new("boom").with_frame(Frame::default());
        let handled = d.report(&["retab", "check"], Box::new(err), &mut out);
        assert!(is_already_handled(&*handled));

        let code = d.finish(&["retab", "check"], Err(handled), &mut out);
        assert_eq!(code, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ERROR - [retab check] - ❌ boom\n"
        );
    }

    #[test]
    fn test_finish_prints_unhandled() {
        let mut out = Vec::new();
        let err = Error::new("boom")
            .with_frame(Frame::default())
            .with_kind(ErrorKind::Usage);
        let code = plain().finish(&["retab"], Err(Box::new(err)), &mut out);
        assert_eq!(code, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "ERROR - [retab] - ❌ boom\n");
    }

    #[test]
    fn test_verbose_format() {
        let d = Dispatcher::new(true, false);
        let err = Error::wrap(Error::new("open file"), "load config");
        let text = d.format(&["retab"], &err);
        assert!(text.starts_with("ERROR - [retab] - load config 👉 open file"));
        assert!(text.contains("👇 load config"));
    }
}
