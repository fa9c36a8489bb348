//! Unit tests for the device registry.

use std::sync::Arc;

use rstest::{fixture, rstest};

use switchctl_protocol::InterfaceType;

use super::*;
use crate::simulated::SimulatedConnector;

struct Harness {
    connector: Arc<SimulatedConnector>,
    registry: DeviceRegistry,
}

impl Harness {
    fn connect(&self, id: &str) -> Result<SwitchModel, DeviceError> {
        self.registry
            .connect(&SwitchId::new(id), InterfaceType::Serial, None)
    }
}

#[fixture]
fn harness() -> Harness {
    let connector = Arc::new(SimulatedConnector::with_switches([
        (SwitchId::new("COM7"), SwitchModel::M3141),
        (SwitchId::new("COM8"), SwitchModel::M2101),
    ]));
    let registry = DeviceRegistry::new(connector.clone());
    Harness {
        connector,
        registry,
    }
}

#[rstest]
fn connecting_twice_reports_already_connected(harness: Harness) {
    assert_eq!(harness.connect("COM7").expect("first connect"), SwitchModel::M3141);
    let error = harness.connect("COM7").expect_err("second connect must fail");
    assert!(matches!(error, DeviceError::AlreadyConnected { .. }));
}

#[rstest]
fn disconnecting_twice_reports_not_connected(harness: Harness) {
    let id = SwitchId::new("COM7");
    harness.connect("COM7").expect("connect");
    harness.registry.disconnect(&id).expect("first disconnect");
    let error = harness
        .registry
        .disconnect(&id)
        .expect_err("second disconnect must fail");
    assert!(matches!(error, DeviceError::NotConnected { .. }));
    assert!(!harness.registry.is_connected(&id));
}

#[rstest]
fn operations_on_absent_switch_report_not_connected(harness: Harness) {
    let id = SwitchId::new("COM7");
    assert!(matches!(
        harness.registry.set_port(&id, 1),
        Err(DeviceError::NotConnected { .. })
    ));
    assert!(matches!(
        harness.registry.status(&id),
        Err(DeviceError::NotConnected { .. })
    ));
}

#[rstest]
fn unknown_switch_fails_to_open(harness: Harness) {
    let error = harness.connect("COM99").expect_err("unknown switch");
    assert!(matches!(error, DeviceError::Open { .. }));
}

#[rstest]
fn set_port_updates_the_switch(harness: Harness) {
    let id = SwitchId::new("COM7");
    harness.connect("COM7").expect("connect");
    harness.registry.set_speed(&id, SpeedMode::Ss0).expect("speed");
    harness.registry.set_port(&id, 2).expect("port");

    let snapshot = harness.connector.snapshot(&id).expect("snapshot");
    assert_eq!(snapshot.port, 2);
    assert_eq!(snapshot.speed, SpeedMode::Ss0);
    assert_eq!(harness.registry.status(&id).expect("status"), "p2 SS0");
}

#[rstest]
#[case(3)]
#[case(9)]
fn ports_beyond_model_are_rejected(harness: Harness, #[case] port: u8) {
    let id = SwitchId::new("COM7");
    harness.connect("COM7").expect("connect");
    let error = harness
        .registry
        .set_port(&id, port)
        .expect_err("port out of range");
    assert!(matches!(error, DeviceError::UnsupportedPort { port: p, .. } if p == port));
}

#[rstest]
fn speed_is_rejected_on_usb2_switch(harness: Harness) {
    let id = SwitchId::new("COM8");
    harness.connect("COM8").expect("connect");
    let error = harness
        .registry
        .set_speed(&id, SpeedMode::Ss1)
        .expect_err("no speed control");
    assert!(matches!(error, DeviceError::UnsupportedSpeed { .. }));
    assert!(matches!(
        harness.registry.volts(&id),
        Err(DeviceError::UnsupportedParameter { .. })
    ));
}

#[rstest]
fn unresponsive_switch_reports_no_response(harness: Harness) {
    let id = SwitchId::new("COM7");
    harness.connect("COM7").expect("connect");
    harness.connector.set_responsive(&id, false);
    let error = harness.registry.set_port(&id, 1).expect_err("no response");
    assert!(matches!(error, DeviceError::NoResponse { .. }));
    assert_eq!(error.kind(), switchctl_protocol::ErrorKind::NoResponse);
}

#[rstest]
fn discovery_flags_connected_switches(harness: Harness) {
    harness.connect("COM8").expect("connect");
    let listings = harness.registry.discover().expect("discover");
    let flags: Vec<(&str, bool)> = listings
        .iter()
        .map(|listing| (listing.id.as_str(), listing.connected))
        .collect();
    assert_eq!(flags, vec![("COM7", false), ("COM8", true)]);
}
