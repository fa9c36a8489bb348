//! Background thread driving a [`SequenceExecutor`].
//!
//! Ticks run one at a time on a dedicated thread and the next tick is armed
//! only after the previous one returns, so steps never overlap. Between
//! ticks the thread waits on a stop channel with the tick's wait as timeout:
//! a stop request ends a pending delay immediately.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use switchctl_device::{ReadParameter, SwitchId};
use switchctl_dispatch::{CommandSink, DispatchError, SwitchCommand};

use crate::executor::{
    DEFAULT_TICK_INTERVAL_MS, ExecutionState, ExecutorStatus, SequenceExecutor, StopReason,
};
use crate::parser::ParsedSequence;
use crate::report::{RunReporter, StructuredRunReporter};
use crate::serial::SerialConsole;

const RUNNER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runner");

/// Errors raised when starting or joining a run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A run is still in progress.
    #[error("a batch run is already in progress")]
    AlreadyRunning,

    /// No run was started.
    #[error("no batch run has been started")]
    NotStarted,

    /// The sequence has no steps.
    #[error("the batch sequence has no steps")]
    EmptySequence,

    /// A required switch failed the pre-flight check.
    #[error("switch {switch} is not available: {source}")]
    MissingSwitch {
        /// Switch that failed.
        switch: SwitchId,
        /// Dispatch failure reported for it.
        #[source]
        source: DispatchError,
    },

    /// The ticker thread could not be spawned.
    #[error("failed to spawn batch thread: {0}")]
    Spawn(#[source] io::Error),

    /// The ticker thread panicked.
    #[error("batch thread panicked")]
    Panicked,

    /// Internal error (e.g., lock poisoned).
    #[error("internal error: {message}")]
    Internal {
        /// Description.
        message: String,
    },
}

/// Run parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Keep cycling past the repeat count until stopped.
    pub until_stopped: bool,
    /// Pause after non-delay steps.
    pub tick_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            until_stopped: false,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
        }
    }
}

/// Final state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Terminal status.
    pub status: ExecutorStatus,
    /// Counters at the end of the run.
    pub state: ExecutionState,
}

struct ActiveRun {
    stop: Sender<()>,
    handle: JoinHandle<RunSummary>,
}

/// Starts, stops and joins batch runs; at most one at a time.
pub struct BatchRunner {
    sink: Arc<dyn CommandSink>,
    serial: Option<Arc<dyn SerialConsole>>,
    reporter: Arc<dyn RunReporter>,
    active: Mutex<Option<ActiveRun>>,
}

impl BatchRunner {
    /// Creates a runner dispatching through `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self {
            sink,
            serial: None,
            reporter: Arc::new(StructuredRunReporter::new()),
            active: Mutex::new(None),
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

    /// Checks the required switches and starts the ticker thread.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::AlreadyRunning`] while a run is in progress,
    /// [`RunnerError::EmptySequence`] for a sequence without steps, and
    /// [`RunnerError::MissingSwitch`] when a required switch does not answer.
    pub fn start(&self, sequence: ParsedSequence, options: RunOptions) -> Result<(), RunnerError> {
        ensure_idle(&*self.lock()?)?;
        if sequence.is_empty() {
            return Err(RunnerError::EmptySequence);
        }
        // Status requests may take the full request timeout per switch.
        if let Err(error) = self.preflight(&sequence) {
            self.reporter.run_rejected(&error);
            return Err(error);
        }
        let mut active = self.lock()?;
        ensure_idle(&active)?;
        if let Some(previous) = active.take()
            && previous.handle.join().is_err()
        {
            warn!(target: RUNNER_TARGET, "previous batch thread panicked");
        }

        let mut executor = SequenceExecutor::new(sequence, Arc::clone(&self.sink))
            .with_reporter(Arc::clone(&self.reporter))
            .with_tick_interval(options.tick_interval)
            .until_stopped(options.until_stopped);
        if let Some(console) = &self.serial {
            executor = executor.with_serial(Arc::clone(console));
        }
        let reporter = Arc::clone(&self.reporter);
        let (stop, stop_signal) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("switchctl-batch".to_owned())
            .spawn(move || run_loop(executor, &stop_signal, reporter.as_ref()))
            .map_err(RunnerError::Spawn)?;
        *active = Some(ActiveRun { stop, handle });
        Ok(())
    }

    /// Asks the current run to stop. Stopping a finished run is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::NotStarted`] when no run exists.
    pub fn stop(&self) -> Result<(), RunnerError> {
        let active = self.lock()?;
        let run = active.as_ref().ok_or(RunnerError::NotStarted)?;
        // The receiver is gone once the run has finished on its own.
        run.stop.send(()).ok();
        Ok(())
    }

    /// Waits for the current run to finish.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::NotStarted`] when no run exists and
    /// [`RunnerError::Panicked`] when the ticker thread panicked.
    pub fn wait(&self) -> Result<RunSummary, RunnerError> {
        let run = self.lock()?.take().ok_or(RunnerError::NotStarted)?;
        run.handle.join().map_err(|_| RunnerError::Panicked)
    }

    /// Starts a run and waits for it to finish.
    ///
    /// # Errors
    ///
    /// See [`BatchRunner::start`] and [`BatchRunner::wait`].
    pub fn run(&self, sequence: ParsedSequence, options: RunOptions) -> Result<RunSummary, RunnerError> {
        self.start(sequence, options)?;
        self.wait()
    }

    /// Whether a run is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock().is_ok_and(|active| {
            active
                .as_ref()
                .is_some_and(|run| !run.handle.is_finished())
        })
    }

    fn preflight(&self, sequence: &ParsedSequence) -> Result<(), RunnerError> {
        for switch in sequence.required_switches() {
            let status = SwitchCommand::Read {
                switch: switch.clone(),
                parameter: ReadParameter::Status,
            };
            self.sink
                .dispatch(&status)
                .map_err(|source| RunnerError::MissingSwitch {
                    switch: switch.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<ActiveRun>>, RunnerError> {
        self.active.lock().map_err(|_| RunnerError::Internal {
            message: "batch runner lock poisoned".to_owned(),
        })
    }
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BatchRunner")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

fn ensure_idle(active: &Option<ActiveRun>) -> Result<(), RunnerError> {
    if active.as_ref().is_some_and(|run| !run.handle.is_finished()) {
        return Err(RunnerError::AlreadyRunning);
    }
    Ok(())
}

fn run_loop(
    mut executor: SequenceExecutor,
    stop_signal: &Receiver<()>,
    reporter: &dyn RunReporter,
) -> RunSummary {
    executor.start();
    reporter.run_started(
        executor.sequence().steps().len(),
        executor.sequence().repeat_count(),
        executor.runs_until_stopped(),
    );
    while executor.status().is_running() {
        let outcome = executor.tick();
        if !executor.status().is_running() {
            break;
        }
        match stop_signal.recv_timeout(outcome.wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => executor.stop(StopReason::Manual),
        }
    }
    let summary = RunSummary {
        status: executor.status(),
        state: executor.state().clone(),
    };
    reporter.run_finished(&summary);
    summary
}
