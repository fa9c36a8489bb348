//! Execution of parsed `switchctl` subcommands.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{debug, info, warn};

use switchctl_batch::{
    BatchRunner, ExecutorStatus, ParsedSequence, RunOptions, RunSummary, SafetyReport, StopReason,
    check, parse,
};
use switchctl_config::Config;
use switchctl_device::{
    DeviceConnector, DeviceRegistry, ReadParameter, SimulatedConnector, SwitchId, SwitchModel,
};
use switchctl_dispatch::{
    CommandSink, DispatchContext, Dispatcher, FaultInterlock, RequestClient, SwitchCommand,
};
use switchctl_protocol::InterfaceType;

use crate::cli::CliCommand;
use crate::errors::AppError;
use crate::script::read_script;

const COMMAND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::commands");

pub(crate) fn execute<W, E>(
    command: CliCommand,
    config: &Config,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
{
    match command {
        CliCommand::Check { script } => check_script(&script, stdout, stderr),
        CliCommand::Run {
            script,
            force,
            until_stopped,
        } => run_script(config, &script, RunFlags { force, until_stopped }, stdout, stderr),
        CliCommand::Status { switch, model } => switch_status(config, switch, model, stdout),
    }
}

#[derive(Debug, Clone, Copy)]
struct RunFlags {
    force: bool,
    until_stopped: bool,
}

fn load_sequence<E: Write>(path: &Path, stderr: &mut E) -> Result<ParsedSequence, AppError> {
    let sequence = parse(&read_script(path)?);
    for warning in sequence.warnings() {
        writeln!(stderr, "warning: {warning}")?;
    }
    Ok(sequence)
}

fn check_script<W, E>(path: &Path, stdout: &mut W, stderr: &mut E) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
{
    let sequence = load_sequence(path, stderr)?;
    writeln!(
        stdout,
        "{} steps, {} switches, repeat {}",
        sequence.steps().len(),
        sequence.aliases().len(),
        sequence.repeat_count()
    )?;
    match check(&sequence) {
        SafetyReport::Passed => {
            writeln!(stdout, "safety check passed")?;
            Ok(ExitCode::SUCCESS)
        }
        SafetyReport::Violation { alias, violation } => Err(AppError::Unsafe { alias, violation }),
    }
}

fn run_script<W, E>(
    config: &Config,
    path: &Path,
    flags: RunFlags,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
{
    let sequence = load_sequence(path, stderr)?;
    if sequence.is_empty() {
        return Err(AppError::EmptyScript);
    }
    if let SafetyReport::Violation { alias, violation } = check(&sequence) {
        if !flags.force {
            return Err(AppError::Unsafe { alias, violation });
        }
        writeln!(stderr, "warning: safety check failed for '{alias}': {violation}")?;
    }

    let connector = SimulatedConnector::with_switches(
        sequence
            .aliases()
            .iter()
            .map(|(_, binding)| (binding.id.clone(), binding.model)),
    );
    let fault = FaultInterlock::new();
    let dispatcher = dispatcher_for(config, Arc::new(connector), fault.clone());
    for (_, binding) in sequence.aliases().iter() {
        open_switch(&dispatcher, &binding.id);
    }

    let runner = Arc::new(BatchRunner::new(Arc::new(dispatcher)));
    let summary = if flags.until_stopped {
        run_until_interrupted(&runner, sequence, &fault)?
    } else {
        runner.run(sequence, RunOptions::default())?
    };
    writeln!(
        stdout,
        "{}: {} cycles, {} passed, {} failed",
        summary.status, summary.state.cycle_count, summary.state.pass_count, summary.state.fail_count
    )?;
    if fault.is_tripped() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(exit_code(&summary))
}

/// Runs until the sequence stops itself or the process is interrupted.
///
/// `SIGTERM` also trips `fault`, so no further port switching goes out
/// through the dispatcher sharing it.
fn run_until_interrupted(
    runner: &Arc<BatchRunner>,
    sequence: ParsedSequence,
    fault: &FaultInterlock,
) -> Result<RunSummary, AppError> {
    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(AppError::Interrupt)?;
    let signal_handle = signals.handle();
    let watched = Arc::clone(runner);
    let watched_fault = fault.clone();
    let watcher = thread::Builder::new()
        .name("switchctl-interrupt".to_owned())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                handle_interrupt(signal, &watched, &watched_fault);
            }
        })
        .map_err(AppError::Interrupt)?;

    let options = RunOptions {
        until_stopped: true,
        ..RunOptions::default()
    };
    let outcome = runner
        .start(sequence, options)
        .and_then(|()| runner.wait());
    signal_handle.close();
    if watcher.join().is_err() {
        debug!(target: COMMAND_TARGET, "interrupt watcher panicked");
    }
    outcome.map_err(AppError::from)
}

/// Stops the run; `SIGTERM` trips the interlock first.
pub(crate) fn handle_interrupt(signal: i32, runner: &BatchRunner, fault: &FaultInterlock) {
    if signal == SIGTERM {
        warn!(target: COMMAND_TARGET, signal, "termination requested; tripping fault interlock");
        fault.trip();
    } else {
        info!(target: COMMAND_TARGET, signal, "interrupt received; stopping run");
    }
    // A run that already finished has nothing left to stop.
    runner.stop().ok();
}

fn switch_status<W: Write>(
    config: &Config,
    switch: String,
    model: SwitchModel,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    let dispatcher = dispatcher_for(
        config,
        Arc::new(SimulatedConnector::permissive(model)),
        FaultInterlock::new(),
    );
    let id = SwitchId::new(&switch);
    open_switch(&dispatcher, &id);
    let reply = dispatcher
        .dispatch(&SwitchCommand::Read {
            switch: id,
            parameter: ReadParameter::Status,
        })
        .map_err(|source| AppError::Switch { switch, source })?;
    writeln!(stdout, "{}", reply.to_text())?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the dispatcher for the configured role.
///
/// `connector` backs the in-process registry and is unused in the network
/// role. Tripping `fault`, or any clone of it, refuses port commands.
pub(crate) fn dispatcher_for(
    config: &Config,
    connector: Arc<dyn DeviceConnector>,
    fault: FaultInterlock,
) -> Dispatcher {
    let context = DispatchContext {
        role: config.role(),
        endpoint: config.control_endpoint().clone(),
        fault,
    };
    Dispatcher::new(
        context,
        Arc::new(DeviceRegistry::new(connector)),
        RequestClient::new(config.request_timeout()),
    )
}

/// Opens `switch`, leaving failures to the checks that follow.
///
/// A switch the server already holds open answers `fail` here and still
/// serves the run.
pub(crate) fn open_switch(dispatcher: &Dispatcher, switch: &SwitchId) {
    let command = SwitchCommand::Open {
        switch: switch.clone(),
        interface: InterfaceType::Serial,
        baud: None,
    };
    if let Err(error) = dispatcher.dispatch(&command) {
        debug!(target: COMMAND_TARGET, %switch, %error, "open failed");
    }
}

fn exit_code(summary: &RunSummary) -> ExitCode {
    let clean_finish = matches!(
        summary.status,
        ExecutorStatus::Completed | ExecutorStatus::Stopped(StopReason::Manual)
    );
    if clean_finish && summary.state.fail_count == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
