//! Test doubles shared by the daemon suites.

use std::ffi::OsString;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use ortho_config::OrthoError;

use switchctl_config::{Config, Endpoint};

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::health::HealthReporter;
use crate::shutdown::{ShutdownError, ShutdownSignal};

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ServerListening(SocketAddr),
    ServerStopped,
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn server_listening(&self, address: SocketAddr) {
        self.record(HealthEvent::ServerListening(address));
    }

    fn server_stopped(&self) {
        self.record(HealthEvent::ServerStopped);
    }
}

/// Configuration that binds an ephemeral loopback port.
pub fn loopback_config() -> Config {
    Config {
        listen_endpoint: Endpoint::tcp("127.0.0.1", 0),
        responder_timeout_ms: 2_000,
        search_timeout_ms: 1_000,
        ..Config::default()
    }
}

/// Loader that intentionally fails by passing an invalid endpoint flag.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter([
            OsString::from("switchctld"),
            OsString::from("--listen-endpoint"),
            OsString::from("unix:///tmp/switchctld.sock"),
        ])
    }
}

/// Shutdown signal that fires immediately.
pub struct ImmediateShutdown;

impl ShutdownSignal for ImmediateShutdown {
    fn wait(&self) -> Result<(), ShutdownError> {
        Ok(())
    }
}
