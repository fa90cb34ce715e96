//! retab command-line interface.
//!
pub mod check;
pub mod dispatch;
pub mod logging;
pub mod options;

pub use dispatch::{Dispatcher, exit_code};
pub use options::{ColorMode, GlobalOptions};
