//! Call-site capture for error records.
//!
//! A [`Frame`] is taken once, when a record is built, and resolved into a
//! [`Location`] only when something renders it. Capture relies on
//! `#[track_caller]`, so every constructor in this crate that is marked with
//! the attribute forwards the *user's* call site and the capture call itself
//! never shows up.
//!
//! The enclosing function comes from one of two places. The `frame!` macro
//! records it at compile time. Otherwise an unresolved backtrace is kept with
//! the frame and symbolized the first time the location is asked for; the
//! symbol whose source file is the call site's file and whose line is
//! nearest to it names the function.

use std::fmt;
use std::panic::Location as CallSite;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use backtrace::Backtrace;

/// Crate-local module path used when a file sits at a crate root.
const ROOT_PACKAGE: &str = "crate";

/// Directories whose contents are laid out as module paths.
const SOURCE_ROOTS: &[&str] = &["src/", "tests/", "examples/", "benches/"];

/// A captured call-site, resolved lazily.
#[derive(Clone, Default)]
pub struct Frame {
    site: Option<&'static CallSite<'static>>,
    function: Option<&'static str>,
    trace: Option<Arc<Trace>>,
}

/// Stack captured alongside a frame; symbolized at most once.
struct Trace {
    frames: Backtrace,
    function: OnceLock<Option<String>>,
}

impl Trace {
    fn capture() -> Self {
        Self {
            frames: Backtrace::new_unresolved(),
            function: OnceLock::new(),
        }
    }

    fn function_at(&self, site: &CallSite<'_>) -> Option<&str> {
        self.function
            .get_or_init(|| resolve_function(&self.frames, site))
            .as_deref()
    }
}

fn resolve_function(trace: &Backtrace, site: &CallSite<'_>) -> Option<String> {
    let file = Path::new(site.file());
    let mut best: Option<(u32, String)> = None;

    for frame in trace.frames() {
        backtrace::resolve(frame.ip(), |symbol| {
            let (Some(name), Some(path), Some(line)) =
                (symbol.name(), symbol.filename(), symbol.lineno())
            else {
                return;
            };
            if !path.ends_with(file) {
                return;
            }
            let distance = line.abs_diff(site.line());
            if best.as_ref().is_none_or(|(nearest, _)| distance < *nearest) {
                best = Some((distance, strip_symbol_hash(&format!("{name:#}")).to_string()));
            }
        });
    }
    best.map(|(_, name)| name)
}

/// Drop a trailing `::h0123456789abcdef` mangling hash.
fn strip_symbol_hash(name: &str) -> &str {
    match name.rsplit_once("::h") {
        Some((head, hash))
            if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) =>
        {
            head
        }
        _ => name,
    }
}

/// A resolved [`Frame`].
///
/// All fields are empty (and `line` is 0) when the frame carries no usable
/// information; callers treat that as "unknown", never as an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub package: String,
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl Frame {
    /// Capture the location of the caller.
    ///
    /// Because this is `#[track_caller]`, calling it from another
    /// `#[track_caller]` function reports *that* function's caller.
    #[track_caller]
    pub fn caller() -> Self {
        Self {
            site: Some(CallSite::caller()),
            function: None,
            trace: Some(Arc::new(Trace::capture())),
        }
    }

    /// Capture the caller with an already known function path, as produced
    /// by `std::any::type_name` (see the `frame!` macro). No stack is kept.
    #[track_caller]
    pub fn named(path: &'static str) -> Self {
        Self {
            site: Some(CallSite::caller()),
            function: Some(path),
            trace: None,
        }
    }

    /// Replace the function path; the captured stack is no longer needed.
    pub fn with_function(mut self, path: &'static str) -> Self {
        self.function = Some(path);
        self.trace = None;
        self
    }

    /// Whether this frame points at a real call site.
    pub fn is_known(&self) -> bool {
        self.site.is_some()
    }

    /// Resolve the frame into package, function, file name and line.
    pub fn location(&self) -> Location {
        let Some(site) = self.site else {
            return Location::default();
        };

        let path = match (self.function, &self.trace) {
            (Some(path), _) => Some(path),
            (None, Some(trace)) => trace.function_at(site),
            (None, None) => None,
        };
        let (package, function) = match path {
            Some(path) => split_function_path(path),
            None => (package_of_file(site.file()), String::new()),
        };

        Location {
            package,
            function,
            file: file_name_of_path(site.file()).to_string(),
            line: site.line(),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc = self.location();
        write!(f, "{}:{} ({}", loc.file, loc.line, loc.package)?;
        if !loc.function.is_empty() {
            write!(f, "::{}", loc.function)?;
        }
        write!(f, ")")
    }
}

impl Location {
    /// `name:line`, the form used in rendered output.
    pub fn file_line(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

/// Last component of a `/` or `\` separated path.
pub fn file_name_of_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Split a `type_name` style function path into `(package, function)`.
///
/// The leading crate name is stripped so packages read as crate-local module
/// paths. Closure segments are dropped. Methods render as `(Type).method`,
/// both for inherent impls (`module::Type::method`) and trait impls
/// (`<module::Type as Trait>::method`).
pub fn split_function_path(path: &str) -> (String, String) {
    let mut path = path;
    while let Some(rest) = path.strip_suffix("::{{closure}}") {
        path = rest;
    }

    if let Some(qualified) = path.strip_prefix('<') {
        if let Some((receiver, method)) = split_trait_impl(qualified) {
            let (module, ty) = split_last(receiver);
            let function = format!("({}).{}", strip_generics(ty), method);
            return (strip_crate_name(module), function);
        }
    }

    let (owner, function) = split_last(path);
    let (module, last) = split_last(owner);
    if !module.is_empty() && is_type_segment(last) {
        let ty = strip_generics(last);
        return (strip_crate_name(module), format!("({ty}).{function}"));
    }
    (strip_crate_name(owner), function.to_string())
}

/// `module::Type as Trait>::method` -> (`module::Type`, `method`).
fn split_trait_impl(qualified: &str) -> Option<(&str, &str)> {
    let close = qualified.rfind(">::")?;
    let receiver = qualified[..close].split(" as ").next()?;
    let method = &qualified[close + 3..];
    Some((receiver, method))
}

/// Split on the last `::` outside of generic brackets.
fn split_last(path: &str) -> (&str, &str) {
    let mut depth = 0usize;
    let bytes = path.as_bytes();
    let mut i = bytes.len();
    while i > 1 {
        i -= 1;
        match bytes[i] {
            b'>' => depth += 1,
            b'<' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes[i - 1] == b':' => {
                return (&path[..i - 1], &path[i + 1..]);
            }
            _ => {}
        }
    }
    ("", path)
}

fn strip_generics(ty: &str) -> &str {
    ty.split('<').next().unwrap_or(ty)
}

fn is_type_segment(segment: &str) -> bool {
    strip_generics(segment)
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase())
}

fn strip_crate_name(module: &str) -> String {
    match module.split_once("::") {
        Some((_, rest)) => rest.to_string(),
        None if module.is_empty() => String::new(),
        None => ROOT_PACKAGE.to_string(),
    }
}

/// Derive a crate-local module path from a source file path.
///
/// Everything up to and including the last `src/`, `tests/`, `examples/` or
/// `benches/` directory is stripped; a file outside all of them is named by
/// its stem. `lib.rs`/`main.rs` map to the crate root and `mod.rs` to its
/// directory.
pub fn package_of_file(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let start = SOURCE_ROOTS
        .iter()
        .filter_map(|root| source_root_end(&normalized, root))
        .max();
    let relative = match start {
        Some(idx) => &normalized[idx..],
        None => file_name_of_path(&normalized),
    };
    let relative = relative.strip_suffix(".rs").unwrap_or(relative);

    let mut segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
    if matches!(segments.last(), Some(&"mod")) {
        segments.pop();
    }
    if matches!(segments.as_slice(), [] | ["lib"] | ["main"]) {
        return ROOT_PACKAGE.to_string();
    }
    segments.join("::").replace('-', "_")
}

/// End of the last `root` directory component in `path`.
fn source_root_end(path: &str, root: &str) -> Option<usize> {
    path.match_indices(root)
        .filter(|(idx, _)| *idx == 0 || path.as_bytes()[idx - 1] == b'/')
        .map(|(idx, _)| idx + root.len())
        .last()
}

/// Capture a [`Frame`] for the current call site, including the enclosing
/// function path.
#[macro_export]
macro_rules! frame {
    () => {
        $crate::Frame::named({
            fn f() {}
            fn name_of<T>(_: T) -> &'static str {
                ::std::any::type_name::<T>()
            }
            let name = name_of(f);
            name.strip_suffix("::f").unwrap_or(name)
        })
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Loader;

    impl Loader {
        fn load(&self) -> Frame {
            crate::frame!()
        }

        fn capture(&self) -> Frame {
            Frame::caller()
        }
    }

    #[test]
    fn test_caller_reports_call_site() {
        let line = line!() + 1;
        let frame = Frame::caller();
        let loc = frame.location();
        assert_eq!(loc.file, "frame.rs");
        assert_eq!(loc.line, line);
        assert_eq!(loc.package, "frame::tests");
        assert_eq!(loc.function, "test_caller_reports_call_site");
    }

    #[test]
    fn test_caller_resolves_method_receiver() {
        let loc = Loader.capture().location();
        assert_eq!(loc.package, "frame::tests");
        assert_eq!(loc.function, "(Loader).capture");
    }

    #[test]
    fn test_named_frame_skips_stack() {
        let frame = Frame::named("retab_cli::check::run");
        assert!(frame.trace.is_none());
        assert_eq!(frame.location().function, "run");
        assert!(Frame::caller().with_function("a::b").trace.is_none());
    }

    #[test]
    fn test_strip_symbol_hash() {
        assert_eq!(
            strip_symbol_hash("retab_error::frame::Frame::caller::h0123456789abcdef"),
            "retab_error::frame::Frame::caller"
        );
        assert_eq!(strip_symbol_hash("a::hello"), "a::hello");
    }

    #[test]
    fn test_frame_macro_resolves_function() {
        let frame = crate::frame!();
        let loc = frame.location();
        assert_eq!(loc.package, "frame::tests");
        assert_eq!(loc.function, "test_frame_macro_resolves_function");
    }

    #[test]
    fn test_frame_macro_renders_method_receiver() {
        let loc = Loader.load().location();
        assert_eq!(loc.package, "frame::tests");
        assert_eq!(loc.function, "(Loader).load");
    }

    #[test]
    fn test_frame_macro_inside_closure() {
        let capture = || crate::frame!();
        let loc = capture().location();
        assert_eq!(loc.function, "test_frame_macro_inside_closure");
    }

    #[test]
    fn test_unknown_frame_is_empty() {
        let loc = Frame::default().location();
        assert_eq!(loc, Location::default());
        assert!(!Frame::default().is_known());
    }

    #[test]
    fn test_split_function_path() {
        assert_eq!(
            split_function_path("retab_cli::check::run"),
            ("check".to_string(), "run".to_string())
        );
        assert_eq!(
            split_function_path("retab_cli::main"),
            ("crate".to_string(), "main".to_string())
        );
        assert_eq!(
            split_function_path("retab_cli::check::Checker::run::{{closure}}"),
            ("check".to_string(), "(Checker).run".to_string())
        );
        assert_eq!(
            split_function_path("<retab_cli::check::Checker<T> as core::fmt::Display>::fmt"),
            ("check".to_string(), "(Checker).fmt".to_string())
        );
        assert_eq!(
            split_function_path("retab_cli::check::Checker<alloc::string::String>::run"),
            ("check".to_string(), "(Checker).run".to_string())
        );
    }

    #[test]
    fn test_package_of_file() {
        assert_eq!(package_of_file("crates/retab-cli/src/check.rs"), "check");
        assert_eq!(package_of_file("crates/retab-cli/src/main.rs"), "crate");
        assert_eq!(package_of_file("src/render/mod.rs"), "render");
        assert_eq!(package_of_file("src/render/inline.rs"), "render::inline");
        assert_eq!(package_of_file("C:\\work\\src\\lib.rs"), "crate");
        assert_eq!(
            package_of_file("crates/retab-error/tests/chain_properties.rs"),
            "chain_properties"
        );
        assert_eq!(package_of_file("crates/retab-cli/tests/common/mod.rs"), "common");
        assert_eq!(package_of_file("crates/retab-cli/benches/render-bench.rs"), "render_bench");
        assert_eq!(package_of_file("crates/retab-cli/build.rs"), "build");
    }

    #[test]
    fn test_file_name_of_path() {
        assert_eq!(file_name_of_path("a/b/c.rs"), "c.rs");
        assert_eq!(file_name_of_path("c.rs"), "c.rs");
    }
}
