//! Behavioural tests for the daemon bootstrap sequence.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use switchctl_device::{SimulatedConnector, SwitchModel};

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, bootstrap_with};

use super::support::{FailingConfigLoader, HealthEvent, RecordingHealthReporter, loopback_config};

struct BootstrapWorld {
    loader: Box<dyn ConfigLoader>,
    reporter: Arc<RecordingHealthReporter>,
    daemon: Option<Daemon>,
    error: Option<BootstrapError>,
}

impl BootstrapWorld {
    fn new() -> Self {
        Self {
            loader: Box::new(StaticConfigLoader::new(loopback_config())),
            reporter: Arc::new(RecordingHealthReporter::default()),
            daemon: None,
            error: None,
        }
    }

    fn bootstrap(&mut self) {
        let connector = Arc::new(SimulatedConnector::permissive(SwitchModel::M3141));
        match bootstrap_with(&*self.loader, self.reporter.clone(), connector) {
            Ok(daemon) => self.daemon = Some(daemon),
            Err(error) => self.error = Some(error),
        }
    }

    fn has_event(&self, predicate: impl Fn(&HealthEvent) -> bool) -> bool {
        self.reporter.events().iter().any(predicate)
    }
}

#[fixture]
fn world() -> RefCell<BootstrapWorld> {
    RefCell::new(BootstrapWorld::new())
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().loader = Box::new(StaticConfigLoader::new(loopback_config()));
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().loader = Box::new(FailingConfigLoader);
}

#[when("the daemon bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().bootstrap();
}

#[when("the request server starts and stops")]
fn when_server_cycles(world: &RefCell<BootstrapWorld>) {
    let world = world.borrow();
    let daemon = world.daemon.as_ref().expect("daemon should be bootstrapped");
    let server = daemon.serve().expect("serve on loopback");
    server.stop().expect("stop server");
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<BootstrapWorld>) {
    let world = world.borrow();
    assert!(world.error.is_none(), "bootstrap error: {:?}", world.error);
    assert!(world.daemon.is_some(), "daemon should have been initialised");
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<BootstrapWorld>) {
    let world = world.borrow();
    assert!(
        matches!(world.error, Some(BootstrapError::Configuration { .. })),
        "expected a configuration failure, got {:?}",
        world.error
    );
}

#[then("the reporter recorded bootstrap start")]
fn then_reporter_start(world: &RefCell<BootstrapWorld>) {
    assert!(world.borrow().has_event(|event| *event == HealthEvent::BootstrapStarting));
}

#[then("the reporter recorded bootstrap success")]
fn then_reporter_success(world: &RefCell<BootstrapWorld>) {
    assert!(world.borrow().has_event(|event| *event == HealthEvent::BootstrapSucceeded));
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<BootstrapWorld>) {
    assert!(
        world
            .borrow()
            .has_event(|event| matches!(event, HealthEvent::BootstrapFailed(_)))
    );
}

#[then("the reporter recorded the server listening")]
fn then_reporter_listening(world: &RefCell<BootstrapWorld>) {
    assert!(world.borrow().has_event(
        |event| matches!(event, HealthEvent::ServerListening(address) if address.port() != 0)
    ));
}

#[then("the reporter recorded the server stopping")]
fn then_reporter_stopped(world: &RefCell<BootstrapWorld>) {
    assert!(world.borrow().has_event(|event| *event == HealthEvent::ServerStopped));
}

#[scenario(path = "tests/features/daemon_bootstrap.feature")]
fn daemon_bootstrap(#[from(world)] world: RefCell<BootstrapWorld>) {
    drop(world);
}
