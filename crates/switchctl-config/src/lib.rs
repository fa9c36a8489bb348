//! Shared configuration for the switch control workspace.
//!
//! The daemon (`switchctld`) and the batch CLI (`switchctl`) load the same
//! [`Config`]. Values are layered by `ortho_config`: built-in defaults, then
//! the configuration file named by `--config-path` or
//! `SWITCHCTL_CONFIG_PATH`, then `SWITCHCTL_*` environment variables, then
//! command-line flags.
//!
//! Only what the dispatch layer needs is persisted here: the command role,
//! the control endpoint, and the server's listen endpoint, plus timeouts and
//! logging.

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

mod defaults;
mod endpoint;
mod logging;
mod role;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use defaults::{
    ALTERNATE_SCC_PORT, ALTERNATE_THC_PORT, DEFAULT_LOG_FILTER, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_RESPONDER_TIMEOUT_MS, DEFAULT_SCC_PORT, DEFAULT_SEARCH_TIMEOUT_MS, DEFAULT_THC_PORT,
    default_control_endpoint, default_listen_endpoint, default_log_filter,
    default_log_filter_string, default_log_format, default_role,
};
pub use endpoint::{Endpoint, EndpointParseError};
pub use logging::{LogFormat, LogFormatParseError};
pub use role::{Role, RoleParseError};

/// Resolved configuration shared by the binaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SWITCHCTL")]
pub struct Config {
    /// Whether switch commands run in-process or on the control computer.
    #[ortho_config(default = default_role())]
    pub role: Role,
    /// Endpoint of the Switch Control Computer used in the network role.
    #[ortho_config(default = default_control_endpoint())]
    pub control_endpoint: Endpoint,
    /// Endpoint the request server binds.
    #[ortho_config(default = default_listen_endpoint())]
    pub listen_endpoint: Endpoint,
    /// Connect and read timeout for client requests, in milliseconds.
    #[ortho_config(default = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub request_timeout_ms: u64,
    /// Read timeout applied by server responders, in milliseconds.
    #[ortho_config(default = DEFAULT_RESPONDER_TIMEOUT_MS)]
    pub responder_timeout_ms: u64,
    /// Upper bound on a device search, in milliseconds.
    #[ortho_config(default = DEFAULT_SEARCH_TIMEOUT_MS)]
    pub search_timeout_ms: u64,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            role: default_role(),
            control_endpoint: default_control_endpoint(),
            listen_endpoint: default_listen_endpoint(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            responder_timeout_ms: DEFAULT_RESPONDER_TIMEOUT_MS,
            search_timeout_ms: DEFAULT_SEARCH_TIMEOUT_MS,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer fails to parse.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first item is treated as the binary name.
    ///
    /// # Errors
    ///
    /// Returns the aggregated loader error when any layer fails to parse.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Command role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Endpoint of the Switch Control Computer.
    #[must_use]
    pub const fn control_endpoint(&self) -> &Endpoint {
        &self.control_endpoint
    }

    /// Endpoint the request server binds.
    #[must_use]
    pub const fn listen_endpoint(&self) -> &Endpoint {
        &self.listen_endpoint
    }

    /// Client connect and read timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Server responder read timeout.
    #[must_use]
    pub const fn responder_timeout(&self) -> Duration {
        Duration::from_millis(self.responder_timeout_ms)
    }

    /// Bound on a device search.
    #[must_use]
    pub const fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
