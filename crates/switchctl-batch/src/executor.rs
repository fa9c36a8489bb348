//! Tick-driven execution of a parsed sequence.
//!
//! [`SequenceExecutor::tick`] runs exactly one step and returns how long to
//! wait before the next tick. The executor never sleeps or spawns; the
//! [`BatchRunner`](crate::BatchRunner) owns timing and cancellation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use switchctl_device::SwitchId;
use switchctl_dispatch::{CommandSink, SwitchCommand};

use crate::parser::ParsedSequence;
use crate::report::{RunReporter, StructuredRunReporter};
use crate::serial::SerialConsole;
use crate::step::{BatchStep, SerialAction};

const EXECUTOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::executor");

/// Default pause between non-delay steps, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1;

/// Why a run stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StopReason {
    /// An operator asked the run to stop.
    Manual,
    /// The fault interlock refused a port command.
    Fault,
}

/// Lifecycle of an executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutorStatus {
    /// Not started.
    #[default]
    Idle,
    /// Ticking.
    Running,
    /// Stopped before completion.
    Stopped(StopReason),
    /// Every requested cycle ran.
    Completed,
}

impl ExecutorStatus {
    /// Whether the executor is ticking.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for ExecutorStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => formatter.write_str("idle"),
            Self::Running => formatter.write_str("running"),
            Self::Stopped(reason) => write!(formatter, "stopped ({reason})"),
            Self::Completed => formatter.write_str("completed"),
        }
    }
}

/// Progress counters, reset on every start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionState {
    /// Index of the next step to run.
    pub step_index: usize,
    /// Completed passes over the whole sequence.
    pub cycle_count: u32,
    /// Serial expectations met.
    pub pass_count: u32,
    /// Failed steps.
    pub fail_count: u32,
    /// Pause after non-delay steps.
    pub tick_interval_ms: u64,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self {
            step_index: 0,
            cycle_count: 0,
            pass_count: 0,
            fail_count: 0,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

/// Counters reported at the end of each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    /// Cycles completed so far.
    pub cycle_count: u32,
    /// Serial expectations met so far.
    pub pass_count: u32,
    /// Failed steps so far.
    pub fail_count: u32,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Wait before the next tick.
    pub wait: Duration,
    /// Present when this tick finished a cycle.
    pub cycle: Option<CycleSummary>,
}

enum StepOutcome {
    Done,
    Wait(Duration),
    Passed,
    Failed(String),
    Fault(String),
}

/// Runs a [`ParsedSequence`] one step per tick.
pub struct SequenceExecutor {
    sequence: ParsedSequence,
    sink: Arc<dyn CommandSink>,
    serial: Option<Arc<dyn SerialConsole>>,
    reporter: Arc<dyn RunReporter>,
    state: ExecutionState,
    status: ExecutorStatus,
    until_stopped: bool,
    current: Option<SwitchId>,
}

impl SequenceExecutor {
    /// Creates an idle executor sending commands to `sink`.
    #[must_use]
    pub fn new(sequence: ParsedSequence, sink: Arc<dyn CommandSink>) -> Self {
        Self {
            sequence,
            sink,
            serial: None,
            reporter: Arc::new(StructuredRunReporter::new()),
            state: ExecutionState::default(),
            status: ExecutorStatus::Idle,
            until_stopped: false,
            current: None,
        }
    }

    /// Attaches the console used by `serial` steps.
    #[must_use]
    pub fn with_serial(mut self, console: Arc<dyn SerialConsole>) -> Self {
        self.serial = Some(console);
        self
    }

    /// Replaces the reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn RunReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Keeps cycling past the repeat count until stopped.
    #[must_use]
    pub const fn until_stopped(mut self, until_stopped: bool) -> Self {
        self.until_stopped = until_stopped;
        self
    }

    /// Sets the pause after non-delay steps.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.state.tick_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sequence being executed.
    #[must_use]
    pub const fn sequence(&self) -> &ParsedSequence {
        &self.sequence
    }

    /// Current counters.
    #[must_use]
    pub const fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> ExecutorStatus {
        self.status
    }

    /// Whether cycling continues past the repeat count.
    #[must_use]
    pub const fn runs_until_stopped(&self) -> bool {
        self.until_stopped
    }

    /// Resets the counters and enters `Running`. An empty sequence completes
    /// immediately.
    pub fn start(&mut self) {
        self.state = ExecutionState {
            tick_interval_ms: self.state.tick_interval_ms,
            ..ExecutionState::default()
        };
        self.current = None;
        self.status = if self.sequence.is_empty() {
            ExecutorStatus::Completed
        } else {
            ExecutorStatus::Running
        };
    }

    /// Stops a running executor. Has no effect otherwise.
    pub fn stop(&mut self, reason: StopReason) {
        if self.status.is_running() {
            info!(target: EXECUTOR_TARGET, %reason, step_index = self.state.step_index, "stopping sequence");
            self.status = ExecutorStatus::Stopped(reason);
        }
    }

    /// Runs the step at `step_index` and advances.
    ///
    /// Returns a zero wait without doing anything unless running.
    pub fn tick(&mut self) -> TickOutcome {
        let idle = TickOutcome {
            wait: Duration::ZERO,
            cycle: None,
        };
        if !self.status.is_running() {
            return idle;
        }
        let index = self.state.step_index;
        let Some(step) = self.sequence.steps().get(index).cloned() else {
            self.status = ExecutorStatus::Completed;
            return idle;
        };

        let mut wait = Duration::from_millis(self.state.tick_interval_ms);
        match self.run_step(&step) {
            StepOutcome::Done => {}
            StepOutcome::Wait(delay) => wait = delay,
            StepOutcome::Passed => {
                self.state.pass_count = self.state.pass_count.saturating_add(1);
            }
            StepOutcome::Failed(message) => {
                self.state.fail_count = self.state.fail_count.saturating_add(1);
                self.reporter.step_failed(index, &message);
            }
            StepOutcome::Fault(message) => {
                self.state.fail_count = self.state.fail_count.saturating_add(1);
                self.reporter.step_failed(index, &message);
                self.stop(StopReason::Fault);
            }
        }

        self.state.step_index += 1;
        let mut cycle = None;
        if self.state.step_index >= self.sequence.steps().len() {
            self.state.step_index = 0;
            self.state.cycle_count = self.state.cycle_count.saturating_add(1);
            let summary = CycleSummary {
                cycle_count: self.state.cycle_count,
                pass_count: self.state.pass_count,
                fail_count: self.state.fail_count,
            };
            self.reporter.cycle_completed(&summary);
            cycle = Some(summary);
            if self.status.is_running()
                && !self.until_stopped
                && self.state.cycle_count >= self.sequence.repeat_count()
            {
                self.status = ExecutorStatus::Completed;
            }
        }
        TickOutcome { wait, cycle }
    }

    fn run_step(&mut self, step: &BatchStep) -> StepOutcome {
        match step {
            BatchStep::Switch(alias) => match self.sequence.aliases().get(alias) {
                Some(binding) => {
                    self.current = Some(binding.id.clone());
                    StepOutcome::Done
                }
                None => StepOutcome::Failed(format!("unknown switch alias '{alias}'")),
            },
            BatchStep::Speed(mode) => self.dispatch_current(|switch| SwitchCommand::Speed {
                switch,
                mode: *mode,
            }),
            BatchStep::Port(port) => self.dispatch_current(|switch| SwitchCommand::Port {
                switch,
                port: *port,
            }),
            BatchStep::Delay(milliseconds) => StepOutcome::Wait(Duration::from_millis(*milliseconds)),
            BatchStep::Read(alias, parameter) => match self.sequence.aliases().get(alias) {
                Some(binding) => self.dispatch(&SwitchCommand::Read {
                    switch: binding.id.clone(),
                    parameter: *parameter,
                }),
                None => StepOutcome::Failed(format!("unknown switch alias '{alias}'")),
            },
            BatchStep::Serial(action, payload) => self.run_serial(*action, payload),
            BatchStep::Repeat(_) | BatchStep::End => StepOutcome::Done,
        }
    }

    fn dispatch_current(&self, command: impl FnOnce(SwitchId) -> SwitchCommand) -> StepOutcome {
        match &self.current {
            Some(switch) => self.dispatch(&command(switch.clone())),
            None => StepOutcome::Failed("no switch selected".to_owned()),
        }
    }

    fn dispatch(&self, command: &SwitchCommand) -> StepOutcome {
        match self.sink.dispatch(command) {
            Ok(reply) => {
                if let SwitchCommand::Read { switch, parameter } = command {
                    info!(
                        target: EXECUTOR_TARGET,
                        switch = %switch,
                        %parameter,
                        value = %reply.to_text(),
                        "switch reading"
                    );
                } else {
                    debug!(target: EXECUTOR_TARGET, switch = %command.switch(), command = command.name(), "step dispatched");
                }
                StepOutcome::Done
            }
            Err(error) if error.is_interlock() => StepOutcome::Fault(error.to_string()),
            Err(error) => StepOutcome::Failed(error.to_string()),
        }
    }

    fn run_serial(&self, action: SerialAction, payload: &str) -> StepOutcome {
        let Some(console) = &self.serial else {
            return StepOutcome::Failed("no serial console configured".to_owned());
        };
        let result = match action {
            SerialAction::Open => {
                let mut words = payload.split_whitespace();
                let path = words.next().unwrap_or_default();
                let baud = words.next().and_then(|baud| baud.parse().ok());
                console.open(path, baud).map(|()| StepOutcome::Done)
            }
            SerialAction::Write => console.write_line(payload).map(|()| StepOutcome::Done),
            SerialAction::Read => console.expect(payload).map(|seen| {
                if seen {
                    StepOutcome::Passed
                } else {
                    StepOutcome::Failed(format!("expected serial output '{payload}' not seen"))
                }
            }),
        };
        result.unwrap_or_else(|error| StepOutcome::Failed(error.to_string()))
    }
}

impl fmt::Debug for SequenceExecutor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SequenceExecutor")
            .field("state", &self.state)
            .field("status", &self.status)
            .field("until_stopped", &self.until_stopped)
            .finish_non_exhaustive()
    }
}
