//! CLI entrypoint for `switchctl`.
//!
//! The binary delegates to [`switchctl_cli::run`], which loads
//! configuration, parses the subcommand, and drives batch scripts against
//! local or remote switches.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: the batch thread logs to stderr while a run is in
    // progress.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    switchctl_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
