//! Unit tests for the safety checker.

use rstest::rstest;

use super::*;
use crate::parser::parse;

const HEADER: &str = "switch sw1 = \"COM7\" \"3141\"\nswitch sw2 = \"COM8\" \"2101\"\nmain:\n";

fn report(body: &str) -> SafetyReport {
    check(&parse(&format!("{HEADER}{body}")))
}

fn violation(alias: &str, violation: SafetyViolation) -> SafetyReport {
    SafetyReport::Violation {
        alias: alias.to_owned(),
        violation,
    }
}

#[rstest]
#[case::short_delay(500, violation("sw1", SafetyViolation::MinimumDelay))]
#[case::long_delay(1500, SafetyReport::Passed)]
fn reference_script(#[case] delay: u64, #[case] expected: SafetyReport) {
    let script = format!(
        "switch sw1=\"COM7\" \"3141\"\nmain:\nport sw1.p1\ndelay {delay}ms\nport sw1.p1\nrepeat 1\nend"
    );
    assert_eq!(check(&parse(&script)), expected);
}

#[test]
fn violation_messages_match_operator_wording() {
    assert_eq!(
        SafetyViolation::MinimumDelay.to_string(),
        "minimum delay should be 1000 msec"
    );
    assert_eq!(
        SafetyViolation::PortWithoutDelay.to_string(),
        "port switching not surrounded with delay"
    );
    assert_eq!(
        SafetyViolation::PortOnWithoutPortOff.to_string(),
        "Port ON not surrounded with Port OFF"
    );
}

#[test]
fn adjacent_delays_are_merged_before_checking() {
    assert_eq!(
        report("port sw1.p1\ndelay 600\ndelay 400\nport sw1.p0"),
        SafetyReport::Passed
    );
}

#[test]
fn inner_port_needs_delay_on_both_sides() {
    assert_eq!(
        report("port sw1.p1\ndelay 1000\nport sw1.p0\nport sw1.p2\ndelay 1000\nport sw1.p0"),
        violation("sw1", SafetyViolation::PortWithoutDelay)
    );
}

#[test]
fn switching_directly_between_ports_is_unsafe() {
    assert_eq!(
        report("port sw1.p1\ndelay 1000\nport sw1.p2\ndelay 1000\nport sw1.p0"),
        violation("sw1", SafetyViolation::PortOnWithoutPortOff)
    );
}

#[test]
fn off_between_ports_is_safe() {
    assert_eq!(
        report("port sw1.p1\ndelay 1000\nport sw1.p0\ndelay 1000\nport sw1.p2\ndelay 1000\nport sw1.p0"),
        SafetyReport::Passed
    );
}

#[test]
fn group_without_delays_passes_minimum_delay_rule() {
    assert_eq!(report("port sw2.p1"), SafetyReport::Passed);
}

#[test]
fn groups_are_checked_in_declaration_order() {
    assert_eq!(
        report("port sw2.p1\ndelay 10\nport sw2.p0\nport sw1.p1\ndelay 10\nport sw1.p0"),
        violation("sw1", SafetyViolation::MinimumDelay)
    );
}

#[test]
fn steps_before_first_switch_are_shared_by_every_group() {
    assert_eq!(
        report("delay 100\nport sw1.p1\ndelay 1000\nport sw1.p0"),
        violation("sw1", SafetyViolation::MinimumDelay)
    );
}

#[test]
fn non_switching_steps_are_ignored() {
    assert_eq!(
        report("port sw1.p1\ndelay 1000\nread sw1 status\nport sw1.p0\nrepeat 2\nend"),
        SafetyReport::Passed
    );
}

#[rstest]
#[case::same_switch("read sw1 volts")]
#[case::other_switch("read sw2 amps")]
fn reads_between_delays_do_not_split_them(#[case] read: &str) {
    let without_read = report("port sw1.p1\ndelay 600ms\ndelay 600ms\nport sw1.p0");
    let with_read = report(&format!(
        "port sw1.p1\ndelay 600ms\n{read}\ndelay 600ms\nport sw1.p0"
    ));
    assert_eq!(without_read, SafetyReport::Passed);
    assert_eq!(with_read, without_read);
}
