//! Error types for the CLI runtime.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use switchctl_batch::{RunnerError, SafetyViolation};
use switchctl_config::telemetry::TelemetryError;
use switchctl_dispatch::DispatchError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to read batch script {path}: {source}")]
    ReadScript { path: PathBuf, source: io::Error },
    #[error("batch script has no steps")]
    EmptyScript,
    #[error("safety check failed for '{alias}': {violation} (use --force to run anyway)")]
    Unsafe {
        alias: String,
        violation: SafetyViolation,
    },
    #[error("batch run failed: {0}")]
    Run(#[from] RunnerError),
    #[error("failed to install the interrupt handler: {0}")]
    Interrupt(io::Error),
    #[error("switch {switch}: {source}")]
    Switch {
        switch: String,
        source: DispatchError,
    },
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
