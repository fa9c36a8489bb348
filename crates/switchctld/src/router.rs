//! Category and command routing for decoded requests.
//!
//! The router turns one [`Request`] into exactly one [`Response`]. It never
//! fails: structurally invalid requests become `Invalid command`, device
//! errors become structured error payloads.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use switchctl_device::{
    DeviceError, DeviceListing, DeviceRegistry, ReadParameter, SpeedMode, SwitchId,
};
use switchctl_protocol::{
    Category, ControlCommand, DeviceCommand, ErrorKind, InterfaceType, Request,
    Response,
};

/// Tracing target for request routing.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes requests to the device registry.
#[derive(Debug, Clone)]
pub(crate) struct RequestRouter {
    registry: Arc<DeviceRegistry>,
    search_timeout: Duration,
}

impl RequestRouter {
    pub(crate) const fn new(registry: Arc<DeviceRegistry>, search_timeout: Duration) -> Self {
        Self {
            registry,
            search_timeout,
        }
    }

    /// Produces the response for `request`.
    pub(crate) fn route(&self, request: &Request) -> Response {
        let Some(category) = request.category() else {
            debug!(target: DISPATCH_TARGET, ctype = %request.ctype, "unknown category");
            return Response::invalid_command();
        };
        debug!(
            target: DISPATCH_TARGET,
            category = category.as_str(),
            cmd = %request.cmd,
            switch = request.switch_id().unwrap_or("-"),
            "routing request"
        );
        match category {
            Category::Device => self.route_device(request),
            Category::Control => self.route_control(request),
        }
    }

    fn route_device(&self, request: &Request) -> Response {
        let Some(command) = request.cmd.as_name().and_then(DeviceCommand::parse) else {
            return Response::invalid_command();
        };
        match command {
            DeviceCommand::Search => self.search(),
            DeviceCommand::Open => {
                let Some(id) = request.switch_id().map(SwitchId::new) else {
                    return Response::invalid_command();
                };
                let interface = request.interface().unwrap_or(InterfaceType::Serial);
                acknowledge(&id, "open", self.registry.connect(&id, interface, request.baud_rate()))
            }
            DeviceCommand::Close => {
                let Some(id) = request.switch_id().map(SwitchId::new) else {
                    return Response::invalid_command();
                };
                acknowledge(&id, "close", self.registry.disconnect(&id))
            }
        }
    }

    fn route_control(&self, request: &Request) -> Response {
        if let Some(command) = request.cmd.as_name().and_then(ControlCommand::parse) {
            return match self.target_switch(request) {
                Ok(id) => self.control(&id, command, request.argument()),
                Err(error) => device_error(&error),
            };
        }
        if request.interface() == Some(InterfaceType::Usb)
            && let Some(port) = request.cmd.as_port_number()
        {
            return match self.target_switch(request) {
                Ok(id) => reply(self.registry.set_port(&id, port)),
                Err(error) => device_error(&error),
            };
        }
        debug!(target: DISPATCH_TARGET, cmd = %request.cmd, "unknown control command");
        Response::invalid_command()
    }

    fn control(&self, id: &SwitchId, command: ControlCommand, argument: Option<&str>) -> Response {
        match command {
            ControlCommand::Switch => match argument.and_then(|stat| stat.parse::<u8>().ok()) {
                Some(port) => reply(self.registry.set_port(id, port)),
                None => Response::invalid_command(),
            },
            ControlCommand::Speed => match argument.and_then(|stat| stat.parse::<SpeedMode>().ok()) {
                Some(mode) => reply(self.registry.set_speed(id, mode)),
                None => Response::invalid_command(),
            },
            ControlCommand::Read => {
                match argument.and_then(|stat| stat.parse::<ReadParameter>().ok()) {
                    Some(parameter) => reply(self.registry.read(id, parameter)),
                    None => Response::invalid_command(),
                }
            }
            ControlCommand::Status => reply(self.registry.status(id)),
            ControlCommand::Volts => reply(self.registry.volts(id)),
            ControlCommand::Amps => reply(self.registry.amps(id)),
        }
    }

    /// Resolves the switch a control command addresses.
    ///
    /// Requests without a `port` target the only connected switch.
    fn target_switch(&self, request: &Request) -> Result<SwitchId, DeviceError> {
        if let Some(id) = request.switch_id() {
            return Ok(SwitchId::new(id));
        }
        let mut connected = self.registry.connected()?;
        match (connected.pop(), connected.is_empty()) {
            (Some(id), true) => Ok(id),
            _ => Err(DeviceError::NotConnected {
                id: SwitchId::new("<unspecified>"),
            }),
        }
    }

    /// Runs discovery on a worker thread and waits at most `search_timeout`.
    fn search(&self) -> Response {
        let (sender, receiver) = mpsc::sync_channel(1);
        let registry = Arc::clone(&self.registry);
        let spawned = thread::Builder::new()
            .name("switchctld-search".to_owned())
            .spawn(move || {
                // The receiver is gone once the wait has timed out.
                let _ = sender.send(registry.discover());
            });
        if let Err(error) = spawned {
            warn!(target: DISPATCH_TARGET, %error, "failed to spawn search worker");
            return Response::error(ErrorKind::Device, format!("search failed: {error}"));
        }
        match receiver.recv_timeout(self.search_timeout) {
            Ok(Ok(listings)) => listing_response(&listings),
            Ok(Err(error)) => device_error(&error),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(
                    target: DISPATCH_TARGET,
                    timeout_ms = self.search_timeout.as_millis(),
                    "device search timed out"
                );
                Response::error(
                    ErrorKind::Timeout,
                    format!(
                        "device search did not finish within {} ms",
                        self.search_timeout.as_millis()
                    ),
                )
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Response::error(ErrorKind::Device, "device search worker exited")
            }
        }
    }
}

fn acknowledge(id: &SwitchId, operation: &str, result: Result<impl Sized, DeviceError>) -> Response {
    match result {
        Ok(_) => Response::success(),
        Err(error) => {
            warn!(target: DISPATCH_TARGET, switch = %id, operation, %error, "device request failed");
            Response::fail()
        }
    }
}

fn reply(result: Result<String, DeviceError>) -> Response {
    match result {
        Ok(text) => Response::text(text),
        Err(error) => device_error(&error),
    }
}

fn device_error(error: &DeviceError) -> Response {
    debug!(target: DISPATCH_TARGET, %error, "device error");
    Response::error(error.kind(), error.to_string())
}

fn listing_response(listings: &[DeviceListing]) -> Response {
    match serde_json::to_value(listings) {
        Ok(value) => Response::from_value(value),
        Err(error) => Response::error(ErrorKind::Device, format!("search failed: {error}")),
    }
}
