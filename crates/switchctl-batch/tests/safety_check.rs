//! Behavioural tests for the batch safety check.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use switchctl_batch::{SafetyReport, check, parse};

const HEADER: &str = "switch sw1 = \"COM7\" \"3141\"\nmain:\n";

#[derive(Default)]
struct SafetyWorld {
    script: String,
    report: Option<SafetyReport>,
}

impl SafetyWorld {
    fn set_body(&mut self, body: &str) {
        self.script = format!("{HEADER}{body}");
    }

    fn report(&self) -> &SafetyReport {
        match self.report.as_ref() {
            Some(report) => report,
            None => panic!("the script has not been checked"),
        }
    }
}

#[fixture]
fn world() -> RefCell<SafetyWorld> {
    RefCell::new(SafetyWorld::default())
}

#[given("a script toggling port 1 of sw1 around a {delay} ms delay")]
fn given_toggle_with_delay(world: &RefCell<SafetyWorld>, delay: u64) {
    world
        .borrow_mut()
        .set_body(&format!("port sw1.p1\ndelay {delay}ms\nport sw1.p1\nrepeat 1\nend\n"));
}

#[given("a script switching sw1 from port 1 straight to port 2")]
fn given_direct_switch(world: &RefCell<SafetyWorld>) {
    world
        .borrow_mut()
        .set_body("port sw1.p1\ndelay 1000\nport sw1.p2\ndelay 1000\nport sw1.p0\n");
}

#[given("a script turning sw1 off twice without a delay in between")]
fn given_missing_delay(world: &RefCell<SafetyWorld>) {
    world
        .borrow_mut()
        .set_body("port sw1.p1\ndelay 1000\nport sw1.p0\nport sw1.p0\ndelay 1000\nport sw1.p1\n");
}

#[when("the script is checked")]
fn when_checked(world: &RefCell<SafetyWorld>) {
    let report = check(&parse(&world.borrow().script));
    world.borrow_mut().report = Some(report);
}

#[then("the check passes")]
fn then_passes(world: &RefCell<SafetyWorld>) {
    let world = world.borrow();
    assert!(world.report().is_passed(), "unexpected report: {:?}", world.report());
}

#[then("the check reports \"{message}\"")]
fn then_reports(world: &RefCell<SafetyWorld>, message: String) {
    let world = world.borrow();
    match world.report() {
        SafetyReport::Violation { alias, violation } => {
            assert_eq!(alias, "sw1");
            assert_eq!(violation.to_string(), message);
        }
        SafetyReport::Passed => panic!("expected a violation reporting '{message}'"),
    }
}

#[scenario(
    path = "tests/features/safety_check.feature",
    name = "Short delays between port changes are flagged"
)]
fn short_delays_are_flagged(#[from(world)] world: RefCell<SafetyWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/safety_check.feature",
    name = "Delays of at least one second pass"
)]
fn long_delays_pass(#[from(world)] world: RefCell<SafetyWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/safety_check.feature",
    name = "Switching straight from one port to another is flagged"
)]
fn direct_switching_is_flagged(#[from(world)] world: RefCell<SafetyWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/safety_check.feature",
    name = "Port changes without surrounding delays are flagged"
)]
fn missing_delays_are_flagged(#[from(world)] world: RefCell<SafetyWorld>) {
    drop(world);
}
