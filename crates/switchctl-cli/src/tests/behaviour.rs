//! Behavioural tests for the CLI against local and remote switches.

use std::cell::RefCell;
use std::ffi::OsString;
use std::path::PathBuf;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::support::{CliHarness, PARKING_SCRIPT, SAFE_SCRIPT, SHORT_DELAY_SCRIPT};

struct CliWorld {
    harness: CliHarness,
    script: Option<PathBuf>,
}

impl CliWorld {
    fn run_script(&mut self, words: &[&str]) {
        let script = self.script.clone().expect("a script should be written first");
        let args: Vec<OsString> = words
            .iter()
            .map(OsString::from)
            .chain([script.into_os_string()])
            .collect();
        self.harness.run(args);
    }
}

#[fixture]
fn world() -> RefCell<CliWorld> {
    RefCell::new(CliWorld {
        harness: CliHarness::new(),
        script: None,
    })
}

#[given("a running switch control daemon")]
fn given_daemon(world: &RefCell<CliWorld>) {
    world.borrow_mut().harness.start_daemon();
}

#[given("the batch script \"{name}\"")]
fn given_script(world: &RefCell<CliWorld>, name: String) {
    let text = match name.as_str() {
        "safe" => SAFE_SCRIPT,
        "short-delay" => SHORT_DELAY_SCRIPT,
        "parking" => PARKING_SCRIPT,
        other => panic!("unknown script {other}"),
    };
    let mut world = world.borrow_mut();
    let path = world.harness.write_script(&format!("{name}.txt"), text);
    world.script = Some(path);
}

#[when("the operator checks the script")]
fn when_checks(world: &RefCell<CliWorld>) {
    world.borrow_mut().run_script(&["check"]);
}

#[when("the operator runs the script")]
fn when_runs(world: &RefCell<CliWorld>) {
    world.borrow_mut().run_script(&["run"]);
}

#[when("the operator force-runs the script")]
fn when_force_runs(world: &RefCell<CliWorld>) {
    let mut world = world.borrow_mut();
    world.run_script(&["run", "--force"]);
    assert!(world.harness.succeeded(), "{}", world.harness.stderr_text());
}

#[when("the operator queries the status of \"{switch}\"")]
fn when_queries_status(world: &RefCell<CliWorld>, switch: String) {
    world.borrow_mut().harness.run(["status", switch.as_str()]);
}

#[then("the CLI succeeds")]
fn then_succeeds(world: &RefCell<CliWorld>) {
    let world = world.borrow();
    assert!(world.harness.succeeded(), "{}", world.harness.stderr_text());
}

#[then("the CLI fails")]
fn then_fails(world: &RefCell<CliWorld>) {
    assert!(!world.borrow().harness.succeeded());
}

#[then("stdout contains \"{snippet}\"")]
fn then_stdout_contains(world: &RefCell<CliWorld>, snippet: String) {
    let stdout = world.borrow().harness.stdout_text();
    assert!(stdout.contains(&snippet), "stdout {stdout:?} lacks {snippet:?}");
}

#[then("stderr contains \"{snippet}\"")]
fn then_stderr_contains(world: &RefCell<CliWorld>, snippet: String) {
    let stderr = world.borrow().harness.stderr_text();
    assert!(stderr.contains(&snippet), "stderr {stderr:?} lacks {snippet:?}");
}

#[scenario(path = "tests/features/switchctl_cli.feature")]
fn switchctl_cli_behaviour(#[from(world)] world: RefCell<CliWorld>) {
    drop(world);
}
