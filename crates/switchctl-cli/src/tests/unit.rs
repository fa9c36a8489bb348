//! Unit tests for the CLI runner.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use rstest::{fixture, rstest};
use signal_hook::consts::signal::{SIGINT, SIGTERM};

use switchctl_batch::BatchRunner;
use switchctl_config::{Config, Endpoint, Role};
use switchctl_device::{SimulatedConnector, SwitchId, SwitchModel};
use switchctl_dispatch::{CommandSink, DispatchError, Dispatcher, FaultInterlock, SwitchCommand};

use super::support::{CliHarness, SAFE_SCRIPT, SHORT_DELAY_SCRIPT};
use crate::commands::{dispatcher_for, handle_interrupt, open_switch};

#[fixture]
fn harness() -> CliHarness {
    CliHarness::new()
}

fn with_script(words: &[&str], script: &Path) -> Vec<OsString> {
    words
        .iter()
        .map(OsString::from)
        .chain([script.as_os_str().to_owned()])
        .collect()
}

#[rstest]
fn check_reports_the_sequence_shape(mut harness: CliHarness) {
    let script = harness.write_script("safe.txt", SAFE_SCRIPT);
    harness.run(with_script(&["check"], &script));
    assert!(harness.succeeded(), "{}", harness.stderr_text());
    assert_eq!(
        harness.stdout_text(),
        "5 steps, 1 switches, repeat 1\nsafety check passed\n"
    );
}

#[rstest]
fn check_fails_on_a_safety_violation(mut harness: CliHarness) {
    let script = harness.write_script("short.txt", SHORT_DELAY_SCRIPT);
    harness.run(with_script(&["check"], &script));
    assert!(!harness.succeeded());
    assert!(
        harness
            .stderr_text()
            .contains("safety check failed for 'target': minimum delay should be 1000 msec"),
        "{}",
        harness.stderr_text()
    );
}

#[rstest]
fn parse_warnings_go_to_stderr(mut harness: CliHarness) {
    let script = harness.write_script(
        "warned.txt",
        "switch target = \"COM7\" \"3141\"\nmain:\nport target.p9\nport target.p1\ndelay 1000\nport target.p0\n",
    );
    harness.run(with_script(&["check"], &script));
    assert!(harness.succeeded(), "{}", harness.stderr_text());
    assert!(harness.stderr_text().starts_with("warning: line 3:"), "{}", harness.stderr_text());
}

#[rstest]
fn unsafe_runs_are_refused_without_force(mut harness: CliHarness) {
    let script = harness.write_script("short.txt", SHORT_DELAY_SCRIPT);
    harness.run(with_script(&["run"], &script));
    assert!(!harness.succeeded());
    assert!(harness.stderr_text().contains("use --force"));
    assert!(harness.stdout_text().is_empty());
}

#[rstest]
fn forced_runs_complete_every_cycle(mut harness: CliHarness) {
    let script = harness.write_script("short.txt", SHORT_DELAY_SCRIPT);
    harness.run(with_script(&["run", "--force"], &script));
    assert!(harness.succeeded(), "{}", harness.stderr_text());
    assert_eq!(
        harness.stdout_text(),
        "completed: 2 cycles, 0 passed, 0 failed\n"
    );
    assert!(harness.stderr_text().contains("warning: safety check failed"));
}

#[rstest]
fn empty_scripts_are_not_run(mut harness: CliHarness) {
    let script = harness.write_script("empty.txt", "# nothing to do\nmain:\n");
    harness.run(with_script(&["run"], &script));
    assert!(!harness.succeeded());
    assert_eq!(harness.stderr_text(), "batch script has no steps\n");
}

#[rstest]
fn missing_scripts_are_reported(mut harness: CliHarness) {
    let script = harness.script_path("absent.txt");
    harness.run(with_script(&["check"], &script));
    assert!(!harness.succeeded());
    assert!(harness.stderr_text().starts_with("failed to read batch script"));
}

#[rstest]
fn local_status_opens_a_simulated_switch(mut harness: CliHarness) {
    harness.run(["status", "COM7"]);
    assert!(harness.succeeded(), "{}", harness.stderr_text());
    assert_eq!(harness.stdout_text(), "p0 SS1\n");
}

#[rstest]
fn unreachable_control_computer_fails_the_status_query(mut harness: CliHarness) {
    let reserved = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("reserve port");
    let port = reserved.local_addr().expect("reserved address").port();
    drop(reserved);
    harness.config.role = Role::Network;
    harness.config.control_endpoint = Endpoint::tcp("127.0.0.1", port);
    harness.config.request_timeout_ms = 500;
    harness.run(["status", "COM7"]);
    assert!(!harness.succeeded());
    assert!(
        harness
            .stderr_text()
            .contains("Control Computer Connection Fail"),
        "{}",
        harness.stderr_text()
    );
}

#[rstest]
fn help_is_written_to_stdout(mut harness: CliHarness) {
    harness.run(["--help"]);
    assert!(harness.succeeded());
    assert!(harness.stdout_text().contains("Usage: switchctl"));
}

#[rstest]
fn unknown_subcommands_are_usage_errors(mut harness: CliHarness) {
    harness.run(["flash"]);
    assert!(!harness.succeeded());
    assert!(harness.stderr_text().contains("unrecognized subcommand"));
}

fn local_dispatcher(fault: &FaultInterlock) -> Dispatcher {
    dispatcher_for(
        &Config::default(),
        Arc::new(SimulatedConnector::permissive(SwitchModel::M3141)),
        fault.clone(),
    )
}

#[test]
fn a_tripped_interlock_refuses_port_switching() {
    let fault = FaultInterlock::new();
    let dispatcher = local_dispatcher(&fault);
    let switch = SwitchId::new("COM7");
    open_switch(&dispatcher, &switch);
    let port = SwitchCommand::Port {
        switch,
        port: 1,
    };
    dispatcher.dispatch(&port).expect("port before trip");

    fault.trip();

    assert!(dispatcher.context().fault.is_tripped());
    assert!(matches!(
        dispatcher.dispatch(&port),
        Err(DispatchError::Interlock)
    ));
}

#[rstest]
#[case::terminate(SIGTERM, true)]
#[case::interrupt(SIGINT, false)]
fn termination_trips_the_interlock(#[case] signal: i32, #[case] tripped: bool) {
    let fault = FaultInterlock::new();
    let runner = BatchRunner::new(Arc::new(local_dispatcher(&fault)));

    handle_interrupt(signal, &runner, &fault);

    assert_eq!(fault.is_tripped(), tripped);
    assert!(!runner.is_running());
}
