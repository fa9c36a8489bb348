//! Request server for the switch control workspace.
//!
//! `switchctld` runs on the Switch Control Computer. It owns a
//! [`DeviceRegistry`](switchctl_device::DeviceRegistry) and answers
//! single-shot JSON requests from `switchctl` clients over TCP: each
//! connection carries one [`Request`](switchctl_protocol::Request) and
//! receives one [`Response`](switchctl_protocol::Response).
//!
//! Startup follows a fixed sequence: load configuration through
//! `ortho_config`, install the `tracing` subscriber, create the registry,
//! then bind the listen endpoint. Each stage reports through a
//! [`HealthReporter`] so failures are visible in structured logs.
//!
//! Requests are handled on one thread per connection. Responders enforce a
//! read timeout, and device searches run on a worker with a bounded wait, so
//! a stalled peer or driver cannot pin a responder forever.

mod bootstrap;
mod health;
mod launch;
mod responder;
mod router;
mod server;
mod shutdown;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use launch::{LaunchError, SIMULATED_MODEL, run_daemon, run_daemon_with};
pub use server::RequestServer;
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
