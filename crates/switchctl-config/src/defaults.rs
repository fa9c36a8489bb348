use crate::endpoint::Endpoint;
use crate::logging::LogFormat;
use crate::role::Role;

/// Control port served by a Switch Control Computer.
pub const DEFAULT_SCC_PORT: u16 = 5566;

/// Alternate control port used by some SCC deployments.
pub const ALTERNATE_SCC_PORT: u16 = 2021;

/// Port served by a Test Host Computer.
pub const DEFAULT_THC_PORT: u16 = 5567;

/// Alternate port used by some THC deployments.
pub const ALTERNATE_THC_PORT: u16 = 2022;

/// Connect and read timeout applied by the request client.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 20_000;

/// Read timeout applied by server responders.
pub const DEFAULT_RESPONDER_TIMEOUT_MS: u64 = 20_000;

/// Upper bound on a `device search` request.
pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 30_000;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default command role.
#[must_use]
pub fn default_role() -> Role {
    Role::Local
}

/// Default endpoint of the Switch Control Computer.
#[must_use]
pub fn default_control_endpoint() -> Endpoint {
    Endpoint::tcp("127.0.0.1", DEFAULT_SCC_PORT)
}

/// Default endpoint the request server listens on.
#[must_use]
pub fn default_listen_endpoint() -> Endpoint {
    Endpoint::tcp("0.0.0.0", DEFAULT_SCC_PORT)
}

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
