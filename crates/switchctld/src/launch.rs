//! Foreground daemon entry point.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use switchctl_device::{DeviceConnector, SimulatedConnector, SwitchModel};

use crate::bootstrap::{BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
use crate::transport::ListenerError;

const LAUNCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launch");

/// Model assumed for switches the simulated driver has not seen before.
pub const SIMULATED_MODEL: SwitchModel = SwitchModel::M3141;

/// Errors surfaced while running the daemon.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the daemon failed.
    #[error("daemon bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[from]
        source: BootstrapError,
    },
    /// The request server could not start or stop cleanly.
    #[error("request server failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[from]
        source: ListenerError,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[from]
        source: ShutdownError,
    },
}

/// Runs the daemon with system configuration until a termination signal.
///
/// Switches are driven by the in-memory simulated connector.
///
/// # Errors
///
/// Returns a [`LaunchError`] when bootstrap, binding, or signal handling
/// fails.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        Arc::new(SimulatedConnector::permissive(SIMULATED_MODEL)),
        &SystemShutdownSignal,
    )
}

/// Runs the daemon with explicit collaborators.
///
/// # Errors
///
/// Returns a [`LaunchError`] when bootstrap, binding, or signal handling
/// fails. The server is stopped before a shutdown error is returned.
pub fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    connector: Arc<dyn DeviceConnector>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let daemon = bootstrap_with(loader, reporter, connector)?;
    let server = daemon.serve()?;
    info!(
        target: LAUNCH_TARGET,
        address = %server.address(),
        "daemon running; waiting for shutdown signal"
    );
    let waited = shutdown.wait();
    server.stop()?;
    waited?;
    Ok(())
}
