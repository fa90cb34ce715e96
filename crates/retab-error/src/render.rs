//! Inline and detailed chain rendering.
//!
//! All forms are pure: they build strings and never write anywhere.

use std::fmt::Write;

use crate::chain::{DynError, chain_of};
use crate::color::{Colorize, Plain, color_code, format_location};
use crate::detail::{IGNORED_KEYS, PRIORITY_KEYS, render_detail};
use crate::error::Error;
use crate::sink::{JsonEventSink, RenderError};

/// Joins a link to its cause.
pub const ARROW: &str = "👉";
/// Marks the terminal (root) link.
pub const FAILURE_MARK: &str = "❌";
/// Precedes each non-terminal link in the detailed form.
pub const DOWN_ARROW: &str = "👇";

/// Options for the detailed form and the detail block.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub priority_keys: Vec<String>,
    pub ignored_keys: Vec<String>,
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            priority_keys: PRIORITY_KEYS.iter().map(|k| k.to_string()).collect(),
            ignored_keys: IGNORED_KEYS.iter().map(|k| k.to_string()).collect(),
            color: false,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_priority_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignored_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn colors(&self) -> &'static dyn Colorize {
        crate::color::colors(self.color)
    }
}

/// Message plus optional code tag.
pub fn message_tag(err: &Error, c: &dyn Colorize) -> String {
    if err.code() != 0 {
        return format!("{}{}", err.message(), color_code(err.code(), c));
    }
    err.message().to_string()
}

/// Message, code and location tag of one link, without its cause.
pub fn self_line(err: &Error, c: &dyn Colorize) -> String {
    if !err.frame().is_known() {
        return message_tag(err, c);
    }
    let loc = err.frame().location();
    format!("{}{}", message_tag(err, c), format_location(&loc, c))
}

/// Join a link's own text to the text of its cause.
///
/// The root's text gets a failure mark if it has none. When the inner text
/// carries no marker at all (a foreign error), the arrow adds one.
pub fn link_text(this: String, inner: Option<String>) -> String {
    let Some(inner) = inner else {
        if this.contains(FAILURE_MARK) {
            return this;
        }
        return format!("{FAILURE_MARK} {this}");
    };

    let mut arrow = ARROW.to_string();
    if !inner.contains(ARROW) && !inner.starts_with(FAILURE_MARK) {
        arrow.push(' ');
        arrow.push_str(FAILURE_MARK);
    }
    format!("{this} {arrow} {inner}")
}

/// Single-line form with locations; this is what `Display` prints.
///
/// `load config[pkg=config][file=load.rs:14] 👉 ❌ open file[pkg=config][file=load.rs:12]`
pub fn inline(err: &Error, c: &dyn Colorize) -> String {
    let inner = err.cause().map(|cause| match cause.downcast_ref::<Error>() {
        Some(record) => inline(record, c),
        None => cause.to_string(),
    });
    link_text(self_line(err, c), inner)
}

/// Single-line form without locations or markers, for compact logs.
///
/// `load config 👉 open file`
pub fn compact(err: &Error) -> String {
    let this = message_tag(err, &Plain);
    match err.cause() {
        Some(cause) => {
            let inner = match cause.downcast_ref::<Error>() {
                Some(record) => compact(record),
                None => cause.to_string(),
            };
            format!("{this} {ARROW} {inner}")
        }
        None => this,
    }
}

/// Self line followed by the link's detail block.
pub fn detailed_self(err: &Error, options: &RenderOptions) -> Result<String, RenderError> {
    let mut out = self_line(err, options.colors());
    let detail = render_detail(err, &mut JsonEventSink::new(), options)?;
    if !detail.is_empty() {
        let _ = write!(out, "\n\n{detail}\n\n");
    }
    Ok(out)
}

/// Multi-line form: every link of the chain, outermost first, each with its
/// detail block. Foreign links print their `Display` text.
pub fn detailed(err: &DynError, options: &RenderOptions) -> Result<String, RenderError> {
    let chain = chain_of(err);
    let mut out = String::from("\n\n");

    for (i, link) in chain.iter().enumerate() {
        let glyph = if i + 1 == chain.len() {
            FAILURE_MARK
        } else {
            DOWN_ARROW
        };
        out.push_str(glyph);
        out.push(' ');
        match link.downcast_ref::<Error>() {
            Some(record) => out.push_str(&detailed_self(record, options)?),
            None => {
                let _ = write!(out, "{link}\n\n");
            }
        }
    }

    out.push_str("\n\n");
    Ok(out)
}

/// Detail block of the first record in the chain, or a placeholder.
pub fn extract_detail(err: &DynError) -> String {
    match crate::chain::first_record(err) {
        Some(record) => record
            .detail()
            .unwrap_or_else(|e| format!("error detail unavailable: {e}")),
        None => "no error detail found".to_string(),
    }
}
