//! Role-aware command routing.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use switchctl_config::{Endpoint, Role};
use switchctl_device::{DeviceError, DeviceRegistry, ReadParameter, SpeedMode, SwitchId};
use switchctl_protocol::{
    ControlCommand, DeviceCommand, ErrorKind, FAIL, INVALID_COMMAND, InterfaceType, Request,
    Response, SUCCESS,
};

use crate::client::{RequestClient, TransportError};
use crate::interlock::FaultInterlock;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatcher");

/// Message reported when the Switch Control Computer cannot be reached.
const CONNECTION_FAIL: &str = "Control Computer Connection Fail";

/// Message reported when the fault interlock rejects a command.
const STOP_EVENT: &str = "Stop Event occurred!";

/// Operation on one switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchCommand {
    /// Open the switch.
    Open {
        /// Target switch.
        switch: SwitchId,
        /// Interface used to reach it.
        interface: InterfaceType,
        /// Serial baud rate.
        baud: Option<u32>,
    },
    /// Close the switch.
    Close {
        /// Target switch.
        switch: SwitchId,
    },
    /// Connect a port, or every port off for `0`.
    Port {
        /// Target switch.
        switch: SwitchId,
        /// Port number.
        port: u8,
    },
    /// Select SuperSpeed mode.
    Speed {
        /// Target switch.
        switch: SwitchId,
        /// Mode to apply.
        mode: SpeedMode,
    },
    /// Read a parameter back.
    Read {
        /// Target switch.
        switch: SwitchId,
        /// Parameter to read.
        parameter: ReadParameter,
    },
}

impl SwitchCommand {
    /// Switch the command addresses.
    #[must_use]
    pub const fn switch(&self) -> &SwitchId {
        match self {
            Self::Open { switch, .. }
            | Self::Close { switch }
            | Self::Port { switch, .. }
            | Self::Speed { switch, .. }
            | Self::Read { switch, .. } => switch,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Close { .. } => "close",
            Self::Port { .. } => "port",
            Self::Speed { .. } => "speed",
            Self::Read { .. } => "read",
        }
    }

    fn to_request(&self) -> Request {
        match self {
            Self::Open {
                switch,
                interface,
                baud,
            } => {
                let request = Request::device(DeviceCommand::Open)
                    .with_port(switch.as_str())
                    .with_interface(*interface);
                match baud {
                    Some(baud) => request.with_baud(*baud),
                    None => request,
                }
            }
            Self::Close { switch } => {
                Request::device(DeviceCommand::Close).with_port(switch.as_str())
            }
            Self::Port { switch, port } => {
                Request::control(InterfaceType::Serial, ControlCommand::Switch)
                    .with_port(switch.as_str())
                    .with_stat(port.to_string())
            }
            Self::Speed { switch, mode } => {
                Request::control(InterfaceType::Serial, ControlCommand::Speed)
                    .with_port(switch.as_str())
                    .with_stat(mode.to_string())
            }
            Self::Read { switch, parameter } => {
                let command = match parameter {
                    ReadParameter::Status => ControlCommand::Status,
                    ReadParameter::Volts => ControlCommand::Volts,
                    ReadParameter::Amps => ControlCommand::Amps,
                    ReadParameter::Version => ControlCommand::Read,
                };
                Request::control(InterfaceType::Serial, command)
                    .with_port(switch.as_str())
                    .with_stat(parameter.to_string())
            }
        }
    }
}

/// Successful result of a dispatched command.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    data: Value,
}

impl Reply {
    /// Wraps a textual result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            data: Value::String(text.into()),
        }
    }

    /// Raw payload.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Payload rendered as text; strings are returned without quotes.
    #[must_use]
    pub fn to_text(&self) -> String {
        match &self.data {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Normalised dispatch failure.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The Switch Control Computer could not be reached.
    #[error("{CONNECTION_FAIL}: {source}")]
    Transport {
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The switch did not respond.
    #[error("switch {switch} did not respond")]
    NoResponse {
        /// Target switch.
        switch: SwitchId,
    },

    /// The server answered with an error.
    #[error("remote error ({kind:?}): {message}")]
    Remote {
        /// Failure class reported by the server.
        kind: ErrorKind,
        /// Server-supplied description.
        message: String,
    },

    /// The local registry failed.
    #[error(transparent)]
    Device(DeviceError),

    /// The fault interlock is tripped.
    #[error("{STOP_EVENT}")]
    Interlock,
}

impl DispatchError {
    /// Whether the fault interlock caused this error.
    #[must_use]
    pub const fn is_interlock(&self) -> bool {
        matches!(self, Self::Interlock)
    }

    fn from_device(switch: &SwitchId, error: DeviceError) -> Self {
        match error {
            DeviceError::NoResponse { .. } => Self::NoResponse {
                switch: switch.clone(),
            },
            other => Self::Device(other),
        }
    }

    fn from_response(switch: &SwitchId, response: Response) -> Result<Reply, Self> {
        if let Some(payload) = response.error_payload() {
            return Err(match payload.error {
                ErrorKind::NoResponse => Self::NoResponse {
                    switch: switch.clone(),
                },
                kind => Self::Remote {
                    kind,
                    message: payload.message,
                },
            });
        }
        if response.is_invalid_command() {
            return Err(Self::Remote {
                kind: ErrorKind::Other,
                message: INVALID_COMMAND.to_owned(),
            });
        }
        if response.as_text() == Some(FAIL) {
            return Err(Self::Remote {
                kind: ErrorKind::Device,
                message: FAIL.to_owned(),
            });
        }
        Ok(Reply {
            data: response.data,
        })
    }
}

/// Executes switch commands on behalf of the batch executor.
pub trait CommandSink: Send + Sync {
    /// Executes one command.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when the command cannot be carried out.
    fn dispatch(&self, command: &SwitchCommand) -> Result<Reply, DispatchError>;
}

/// Routing parameters shared by every dispatch.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    /// Whether switches are local or behind the request server.
    pub role: Role,
    /// Request server endpoint used in the network role.
    pub endpoint: Endpoint,
    /// Fault interlock consulted before port commands.
    pub fault: FaultInterlock,
}

/// Routes [`SwitchCommand`]s to the registry or the request server.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    context: DispatchContext,
    registry: Arc<DeviceRegistry>,
    client: RequestClient,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub const fn new(
        context: DispatchContext,
        registry: Arc<DeviceRegistry>,
        client: RequestClient,
    ) -> Self {
        Self {
            context,
            registry,
            client,
        }
    }

    /// Routing parameters.
    #[must_use]
    pub const fn context(&self) -> &DispatchContext {
        &self.context
    }

    fn dispatch_local(&self, command: &SwitchCommand) -> Result<Reply, DeviceError> {
        let text = match command {
            SwitchCommand::Open {
                switch,
                interface,
                baud,
            } => {
                self.registry.connect(switch, *interface, *baud)?;
                SUCCESS.to_owned()
            }
            SwitchCommand::Close { switch } => {
                self.registry.disconnect(switch)?;
                SUCCESS.to_owned()
            }
            SwitchCommand::Port { switch, port } => self.registry.set_port(switch, *port)?,
            SwitchCommand::Speed { switch, mode } => self.registry.set_speed(switch, *mode)?,
            SwitchCommand::Read { switch, parameter } => self.registry.read(switch, *parameter)?,
        };
        Ok(Reply::text(text))
    }

    fn dispatch_remote(&self, command: &SwitchCommand) -> Result<Reply, DispatchError> {
        let response = self
            .client
            .send(&self.context.endpoint, &command.to_request())
            .map_err(|source| DispatchError::Transport { source })?;
        DispatchError::from_response(command.switch(), response)
    }
}

impl CommandSink for Dispatcher {
    fn dispatch(&self, command: &SwitchCommand) -> Result<Reply, DispatchError> {
        if matches!(command, SwitchCommand::Port { .. }) && self.context.fault.is_tripped() {
            warn!(target: DISPATCH_TARGET, switch = %command.switch(), "port command refused: interlock tripped");
            return Err(DispatchError::Interlock);
        }
        debug!(
            target: DISPATCH_TARGET,
            role = %self.context.role,
            switch = %command.switch(),
            command = command.name(),
            "dispatching"
        );
        let result = match self.context.role {
            Role::Local => self
                .dispatch_local(command)
                .map_err(|error| DispatchError::from_device(command.switch(), error)),
            Role::Network => self.dispatch_remote(command),
        };
        if let Err(error) = &result {
            warn!(target: DISPATCH_TARGET, switch = %command.switch(), command = command.name(), %error, "dispatch failed");
        }
        result
    }
}
