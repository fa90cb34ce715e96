use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use retab_cli::check;
use retab_cli::logging;
use retab_cli::{Dispatcher, GlobalOptions};

#[derive(Parser, Debug)]
#[command(
    name = "retab",
    about = "retab: reformat configuration files, with errors that say where",
    version
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that files are readable, non-empty UTF-8 text
    Check {
        /// Files to check (repeatable)
        #[arg(value_name = "FILE", num_args = 1.., required = true)]
        files: Vec<PathBuf>,
    },
}

pub fn run(args: Cli) -> u8 {
    logging::init(args.global.verbose);

    let dispatcher = Dispatcher::from_options(&args.global, io::stderr().is_terminal());
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();

    match args.command {
        Command::Check { files } => {
            let result = check::run(&dispatcher, &files, &mut stdout, &mut stderr);
            dispatcher.finish(check::COMMAND_PATH, result, &mut stderr)
        }
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();
    ExitCode::from(run(args))
}
