//! Command-line argument definitions for `switchctl`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use switchctl_device::SwitchModel;

/// Batch switching front end for USB switches.
#[derive(Parser, Debug)]
#[command(name = "switchctl", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Top-level operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Parses a batch script and reports safety violations.
    Check {
        /// Path to the batch script.
        script: PathBuf,
    },
    /// Runs a batch script against the configured switches.
    Run {
        /// Path to the batch script.
        script: PathBuf,
        /// Runs the script even when the safety check fails.
        #[arg(long)]
        force: bool,
        /// Keeps cycling until interrupted instead of honouring `repeat`.
        #[arg(long)]
        until_stopped: bool,
    },
    /// Opens a switch and prints its status line.
    Status {
        /// Switch identifier, such as a serial port name.
        switch: String,
        /// Model assumed for switches opened in the local role.
        #[arg(long, default_value = "3141", value_parser = parse_model)]
        model: SwitchModel,
    },
}

fn parse_model(value: &str) -> Result<SwitchModel, String> {
    value
        .parse::<SwitchModel>()
        .map_err(|_| format!("unsupported switch model '{value}'"))
}
