//! Structured reporting for batch run lifecycle events.

use std::sync::Arc;

use crate::executor::{CycleSummary, ExecutorStatus};
use crate::runner::{RunSummary, RunnerError};

const RUN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runner");

/// Observer trait used to surface run events to telemetry sinks.
pub trait RunReporter: Send + Sync {
    /// Invoked once the ticker thread starts.
    fn run_started(&self, steps: usize, repeat_count: u32, until_stopped: bool);

    /// Invoked when the pre-flight check rejects a run.
    fn run_rejected(&self, error: &RunnerError);

    /// Invoked when a step fails without stopping the run.
    fn step_failed(&self, step_index: usize, message: &str);

    /// Invoked each time the last step of the sequence completes.
    fn cycle_completed(&self, summary: &CycleSummary);

    /// Invoked when the run leaves the running state.
    fn run_finished(&self, summary: &RunSummary);
}

impl<T> RunReporter for Arc<T>
where
    T: RunReporter + ?Sized,
{
    fn run_started(&self, steps: usize, repeat_count: u32, until_stopped: bool) {
        (**self).run_started(steps, repeat_count, until_stopped);
    }

    fn run_rejected(&self, error: &RunnerError) {
        (**self).run_rejected(error);
    }

    fn step_failed(&self, step_index: usize, message: &str) {
        (**self).step_failed(step_index, message);
    }

    fn cycle_completed(&self, summary: &CycleSummary) {
        (**self).cycle_completed(summary);
    }

    fn run_finished(&self, summary: &RunSummary) {
        (**self).run_finished(summary);
    }
}

/// Default reporter that records run events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredRunReporter;

impl StructuredRunReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RunReporter for StructuredRunReporter {
    fn run_started(&self, steps: usize, repeat_count: u32, until_stopped: bool) {
        tracing::info!(
            target: RUN_TARGET,
            event = "run_started",
            steps,
            repeat_count,
            until_stopped,
            "batch run started"
        );
    }

    fn run_rejected(&self, error: &RunnerError) {
        tracing::error!(
            target: RUN_TARGET,
            event = "run_rejected",
            error = %error,
            "batch run rejected"
        );
    }

    fn step_failed(&self, step_index: usize, message: &str) {
        tracing::warn!(
            target: RUN_TARGET,
            event = "step_failed",
            step_index,
            message,
            "batch step failed"
        );
    }

    fn cycle_completed(&self, summary: &CycleSummary) {
        tracing::info!(
            target: RUN_TARGET,
            event = "cycle_completed",
            cycle_count = summary.cycle_count,
            pass_count = summary.pass_count,
            fail_count = summary.fail_count,
            "batch cycle completed"
        );
    }

    fn run_finished(&self, summary: &RunSummary) {
        let status = summary.status;
        let state = &summary.state;
        match status {
            ExecutorStatus::Completed => tracing::info!(
                target: RUN_TARGET,
                event = "run_finished",
                status = %status,
                cycle_count = state.cycle_count,
                pass_count = state.pass_count,
                fail_count = state.fail_count,
                "batch run completed"
            ),
            _ => tracing::warn!(
                target: RUN_TARGET,
                event = "run_finished",
                status = %status,
                cycle_count = state.cycle_count,
                pass_count = state.pass_count,
                fail_count = state.fail_count,
                "batch run stopped"
            ),
        }
    }
}
