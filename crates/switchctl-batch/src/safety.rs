//! Advisory checks on switching patterns.
//!
//! Only `Switch`, `Port` and `Delay` steps are considered. Adjacent delays are
//! merged, then steps are grouped per switch alias. Steps preceding the first
//! `Switch` belong to every group. Groups are checked in alias declaration
//! order and the first violation ends the check.

use std::collections::HashMap;

use crate::parser::ParsedSequence;
use crate::step::BatchStep;

/// Shortest delay allowed between port changes, in milliseconds.
pub const MINIMUM_DELAY_MS: u64 = 1000;

/// Safety rule broken by a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SafetyViolation {
    /// A delay shorter than [`MINIMUM_DELAY_MS`].
    #[error("minimum delay should be 1000 msec")]
    MinimumDelay,
    /// A port change without a delay on both sides.
    #[error("port switching not surrounded with delay")]
    PortWithoutDelay,
    /// A port turned on right after or before a different port.
    #[error("Port ON not surrounded with Port OFF")]
    PortOnWithoutPortOff,
}

/// Outcome of [`check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyReport {
    /// Every group satisfies every rule.
    Passed,
    /// The first group found breaking a rule.
    Violation {
        /// Alias of the offending group.
        alias: String,
        /// Rule broken.
        violation: SafetyViolation,
    },
}

impl SafetyReport {
    /// Whether the sequence passed.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Switching<'a> {
    Select(&'a str),
    Port(u8),
    Delay(u64),
}

/// Checks the switching steps of `sequence`.
#[must_use]
pub fn check(sequence: &ParsedSequence) -> SafetyReport {
    let groups = partition(&merge_delays(sequence.steps()));
    for (alias, _) in sequence.aliases().iter() {
        let Some(group) = groups.get(alias) else {
            continue;
        };
        if let Some(violation) = check_group(group) {
            return SafetyReport::Violation {
                alias: alias.to_owned(),
                violation,
            };
        }
    }
    SafetyReport::Passed
}

fn merge_delays(steps: &[BatchStep]) -> Vec<Switching<'_>> {
    let mut merged: Vec<Switching<'_>> = Vec::with_capacity(steps.len());
    for step in steps {
        let entry = match step {
            BatchStep::Switch(alias) => Switching::Select(alias),
            BatchStep::Port(port) => Switching::Port(*port),
            BatchStep::Delay(milliseconds) => Switching::Delay(*milliseconds),
            _ => continue,
        };
        if let (Some(Switching::Delay(previous)), Switching::Delay(next)) =
            (merged.last_mut(), entry)
        {
            *previous = previous.saturating_add(next);
            continue;
        }
        merged.push(entry);
    }
    merged
}

fn partition<'a>(entries: &[Switching<'a>]) -> HashMap<&'a str, Vec<Switching<'a>>> {
    let mut shared = Vec::new();
    let mut groups: HashMap<&str, Vec<Switching<'_>>> = HashMap::new();
    let mut current = None;

    for entry in entries {
        match (entry, current) {
            (Switching::Select(alias), _) => {
                current = Some(*alias);
                groups.entry(*alias).or_insert_with(|| shared.clone());
            }
            (_, Some(alias)) => groups.entry(alias).or_default().push(*entry),
            (_, None) => shared.push(*entry),
        }
    }
    groups
}

fn check_group(group: &[Switching]) -> Option<SafetyViolation> {
    if group
        .iter()
        .any(|entry| matches!(entry, Switching::Delay(milliseconds) if *milliseconds < MINIMUM_DELAY_MS))
    {
        return Some(SafetyViolation::MinimumDelay);
    }

    let last = group.len().saturating_sub(1);
    let port_without_delay = group.iter().enumerate().any(|(index, entry)| {
        matches!(entry, Switching::Port(_))
            && index != 0
            && index != last
            && !(is_delay(group.get(index - 1)) && is_delay(group.get(index + 1)))
    });
    if port_without_delay {
        return Some(SafetyViolation::PortWithoutDelay);
    }

    let ports: Vec<u8> = group
        .iter()
        .filter_map(|entry| match entry {
            Switching::Port(port) => Some(*port),
            Switching::Select(_) | Switching::Delay(_) => None,
        })
        .collect();
    let unsafe_on = ports.iter().enumerate().any(|(index, &port)| {
        let conflicts = |neighbour: Option<&u8>| neighbour.is_some_and(|&other| other != 0 && other != port);
        port != 0
            && (conflicts(index.checked_sub(1).and_then(|before| ports.get(before)))
                || conflicts(ports.get(index + 1)))
    });
    if unsafe_on {
        return Some(SafetyViolation::PortOnWithoutPortOff);
    }
    None
}

fn is_delay(entry: Option<&Switching>) -> bool {
    matches!(entry, Some(Switching::Delay(_)))
}

#[cfg(test)]
mod tests;
