//! Optional terminal decoration for rendered errors.
//!
//! Renderers ask a [`Colorize`] implementation to paint each piece by its
//! semantic [`Role`]. [`Plain`] returns text untouched and is what `Display`,
//! log sinks and tests use; [`Ansi`] adds SGR escapes.

use crate::frame::{Location, file_name_of_path};

/// Semantic role of a rendered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// `[` and `]` around a location tag
    Bracket,
    /// Tag label such as `pkg` or `file`
    Label,
    /// `=` between a label and its value
    Equals,
    Package,
    FileName,
    Line,
    /// `{` and `}` around a code tag
    CodeBracket,
    CodeLabel,
    Code,
    /// Last segment of a command path
    Command,
    /// `ERROR` heading in command output
    Heading,
    /// Body of a failure message in command output
    Failure,
}

/// Terminal color capability.
pub trait Colorize {
    fn paint(&self, role: Role, text: &str) -> String;
}

/// No decoration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Colorize for Plain {
    fn paint(&self, _role: Role, text: &str) -> String {
        text.to_string()
    }
}

/// ANSI SGR decoration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ansi;

impl Ansi {
    fn code(role: Role) -> &'static str {
        match role {
            Role::Bracket => "2;96",
            Role::Label => "2;95",
            Role::Equals => "2;30",
            Role::Package => "92",
            Role::FileName => "1",
            Role::Line => "1;91",
            Role::CodeBracket => "2;91",
            Role::CodeLabel => "2;90",
            Role::Code => "1;91",
            Role::Command => "91",
            Role::Heading => "1;31",
            Role::Failure => "31",
        }
    }
}

impl Colorize for Ansi {
    fn paint(&self, role: Role, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        format!("\u{1b}[{}m{text}\u{1b}[0m", Self::code(role))
    }
}

/// Pick a palette. `false` always yields [`Plain`].
pub fn colors(enabled: bool) -> &'static dyn Colorize {
    if enabled {
        return &Ansi;
    }
    &Plain
}

/// `[label=value]`
pub fn color_brackets(label: &str, value: &str, c: &dyn Colorize) -> String {
    format!(
        "{}{}{}{}{}",
        c.paint(Role::Bracket, "["),
        c.paint(Role::Label, label),
        c.paint(Role::Equals, "="),
        value,
        c.paint(Role::Bracket, "]"),
    )
}

/// `{code=N}`
pub fn color_code(code: i32, c: &dyn Colorize) -> String {
    format!(
        "{}{}{}{}{}",
        c.paint(Role::CodeBracket, "{"),
        c.paint(Role::CodeLabel, "code"),
        c.paint(Role::Equals, "="),
        c.paint(Role::Code, &code.to_string()),
        c.paint(Role::CodeBracket, "}"),
    )
}

/// `[pkg=package][file=name:line]`
pub fn format_caller(package: &str, path: &str, line: u32, c: &dyn Colorize) -> String {
    let pkg = color_brackets("pkg", &c.paint(Role::Package, package), c);
    let file = color_brackets(
        "file",
        &format!(
            "{}:{}",
            c.paint(Role::FileName, file_name_of_path(path)),
            c.paint(Role::Line, &line.to_string())
        ),
        c,
    );
    format!("{pkg}{file}")
}

/// [`format_caller`] for a resolved location.
pub fn format_location(loc: &Location, c: &dyn Colorize) -> String {
    format_caller(&loc.package, &loc.file, loc.line, c)
}
