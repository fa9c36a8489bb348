//! Shared fixtures for the CLI suites.

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tempfile::TempDir;

use switchctl_config::{Config, Endpoint, Role};
use switchctl_device::{SimulatedConnector, SwitchModel};
use switchctld::{RequestServer, StaticConfigLoader as DaemonConfigLoader, StructuredHealthReporter};

use crate::config::ConfigLoader;
use crate::errors::AppError;
use crate::run_with_loader;

/// Passes the ports safety rules: one port on, a full second, all off.
pub(crate) const SAFE_SCRIPT: &str =
    "switch target = \"COM7\" \"3141\"\nmain:\nport target.p1\ndelay 1000\nport target.p0\n";

/// Cycles twice with delays below the safety minimum.
pub(crate) const SHORT_DELAY_SCRIPT: &str = "switch target = \"COM7\" \"3141\"\nmain:\nport target.p2\ndelay 5\nport target.p0\nrepeat 2\n";

/// Leaves port 2 connected.
pub(crate) const PARKING_SCRIPT: &str =
    "switch target = \"COM7\" \"3141\"\nmain:\nport target.p2\ndelay 5\n";

pub(crate) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(crate) const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Runs the CLI in-process against scripts in a temporary directory.
pub(crate) struct CliHarness {
    pub(crate) config: Config,
    dir: TempDir,
    daemon: Option<RequestServer>,
    pub(crate) stdout: Vec<u8>,
    pub(crate) stderr: Vec<u8>,
    pub(crate) exit_code: Option<ExitCode>,
}

impl CliHarness {
    pub(crate) fn new() -> Self {
        Self {
            config: Config::default(),
            dir: TempDir::new().expect("temp dir"),
            daemon: None,
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
        }
    }

    pub(crate) fn write_script(&self, name: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, text).expect("write script");
        path
    }

    pub(crate) fn script_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Starts an in-process request server and points the CLI at it.
    pub(crate) fn start_daemon(&mut self) {
        let daemon_config = Config {
            listen_endpoint: Endpoint::tcp("127.0.0.1", 0),
            ..Config::default()
        };
        let daemon = switchctld::bootstrap_with(
            &DaemonConfigLoader::new(daemon_config),
            Arc::new(StructuredHealthReporter::new()),
            Arc::new(SimulatedConnector::permissive(SwitchModel::M3141)),
        )
        .expect("bootstrap daemon");
        let server = daemon.serve().expect("serve on loopback");
        self.config.role = Role::Network;
        self.config.control_endpoint = Endpoint::tcp("127.0.0.1", server.address().port());
        self.config.request_timeout_ms = 2_000;
        self.daemon = Some(server);
    }

    pub(crate) fn run<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.stdout.clear();
        self.stderr.clear();
        let args = std::iter::once(OsString::from("switchctl")).chain(args.into_iter().map(Into::into));
        let loader = StaticConfigLoader::new(self.config.clone());
        self.exit_code = Some(run_with_loader(
            args,
            &mut self.stdout,
            &mut self.stderr,
            &loader,
        ));
    }

    pub(crate) fn stdout_text(&self) -> String {
        String::from_utf8(self.stdout.clone()).expect("stdout utf8")
    }

    pub(crate) fn stderr_text(&self) -> String {
        String::from_utf8(self.stderr.clone()).expect("stderr utf8")
    }

    pub(crate) fn succeeded(&self) -> bool {
        self.exit_code.expect("exit code recorded") == ExitCode::SUCCESS
    }
}

impl Drop for CliHarness {
    fn drop(&mut self) {
        if let Some(server) = self.daemon.take() {
            server.stop().ok();
        }
    }
}
