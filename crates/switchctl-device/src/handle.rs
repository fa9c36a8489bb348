//! Traits implemented by switch drivers.

use serde::Serialize;

use switchctl_protocol::InterfaceType;

use crate::error::DeviceError;
use crate::model::{ReadParameter, SpeedMode, SwitchId, SwitchModel};

/// Open connection to one switch.
///
/// Handles are owned by the [`DeviceRegistry`](crate::DeviceRegistry) and are
/// only ever used by one thread at a time. Port and speed arguments have
/// already been validated against [`DeviceHandle::model`].
pub trait DeviceHandle: Send {
    /// Model of the connected switch.
    fn model(&self) -> SwitchModel;

    /// Connects `port`, or disconnects every port when `port` is `0`.
    ///
    /// # Errors
    ///
    /// Returns an error when the switch does not acknowledge the command.
    fn set_port(&mut self, port: u8) -> Result<String, DeviceError>;

    /// Selects the SuperSpeed mode used for the next port connection.
    ///
    /// # Errors
    ///
    /// Returns an error when the switch does not acknowledge the command.
    fn set_speed(&mut self, mode: SpeedMode) -> Result<String, DeviceError>;

    /// Reads a parameter back from the switch.
    ///
    /// # Errors
    ///
    /// Returns an error when the switch does not answer.
    fn read(&mut self, parameter: ReadParameter) -> Result<String, DeviceError>;

    /// Releases the underlying port. Called once, on disconnect.
    fn close(&mut self) {}
}

/// Factory for [`DeviceHandle`]s and source of discovery results.
pub trait DeviceConnector: Send + Sync {
    /// Opens the switch identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Open`] when the switch cannot be opened.
    fn open(
        &self,
        id: &SwitchId,
        interface: InterfaceType,
        baud: Option<u32>,
    ) -> Result<Box<dyn DeviceHandle>, DeviceError>;

    /// Lists the switches currently attached.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Discovery`] when enumeration fails.
    fn discover(&self) -> Result<Vec<DeviceListing>, DeviceError>;
}

/// One entry of a discovery result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceListing {
    /// Switch identifier.
    pub id: SwitchId,
    /// Model, when the connector could identify it.
    pub model: Option<SwitchModel>,
    /// Interface the switch is reachable through.
    #[serde(serialize_with = "serialize_interface")]
    pub interface: InterfaceType,
    /// Whether the registry currently holds a handle for the switch.
    pub connected: bool,
}

fn serialize_interface<S>(interface: &InterfaceType, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(interface.as_str())
}
