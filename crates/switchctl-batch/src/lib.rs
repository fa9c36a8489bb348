//! Batch sequence engine.
//!
//! A batch script is parsed into a [`ParsedSequence`], checked against the
//! switching safety rules by [`check`], and run by a [`BatchRunner`], which
//! drives a tick-based [`SequenceExecutor`] on its own thread. Switch
//! commands leave the engine through a
//! [`CommandSink`](switchctl_dispatch::CommandSink), so the same sequence can
//! target local or remote switches.

mod executor;
mod parser;
mod report;
mod runner;
mod safety;
mod serial;
mod step;

pub use executor::{
    CycleSummary, ExecutionState, ExecutorStatus, SequenceExecutor, StopReason, TickOutcome,
};
pub use parser::{ParseWarning, ParsedSequence, parse};
pub use report::{RunReporter, StructuredRunReporter};
pub use runner::{BatchRunner, RunOptions, RunSummary, RunnerError};
pub use safety::{SafetyReport, SafetyViolation, check};
pub use serial::{SerialConsole, SerialError};
pub use step::{AliasMap, BatchStep, SerialAction, SwitchBinding};
