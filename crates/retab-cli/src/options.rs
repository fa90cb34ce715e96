//! Global CLI options shared by every retab subcommand.

use clap::{Args, ValueEnum};

/// When to decorate terminal output with ANSI colors.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color when stderr is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty && std::env::var_os("NO_COLOR").is_none(),
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Options accepted before any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Print the full error chain with structured details, and debug logs.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Colorize error output.
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: ColorMode,
}

impl GlobalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mode() {
        assert!(ColorMode::Always.use_color(false));
        assert!(!ColorMode::Never.use_color(true));
        assert!(!ColorMode::Auto.use_color(false));
    }

    #[test]
    fn test_builders() {
        let opts = GlobalOptions::new()
            .with_verbose(true)
            .with_color(ColorMode::Never);
        assert!(opts.verbose);
        assert_eq!(opts.color, ColorMode::Never);
    }
}
