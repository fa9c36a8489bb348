//! Shared map of open switch handles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use switchctl_protocol::InterfaceType;

use crate::REGISTRY_TARGET;
use crate::error::DeviceError;
use crate::handle::{DeviceConnector, DeviceHandle, DeviceListing};
use crate::model::{ReadParameter, SpeedMode, SwitchId, SwitchModel};

/// Owns at most one open [`DeviceHandle`] per [`SwitchId`].
///
/// Opens are serialised: the map lock is held while the connector opens a
/// switch, so two concurrent connects for the same id cannot both succeed.
pub struct DeviceRegistry {
    connector: Arc<dyn DeviceConnector>,
    handles: Mutex<HashMap<SwitchId, Box<dyn DeviceHandle>>>,
}

impl DeviceRegistry {
    /// Creates an empty registry backed by `connector`.
    #[must_use]
    pub fn new(connector: Arc<dyn DeviceConnector>) -> Self {
        Self {
            connector,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Opens `id` and stores its handle.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::AlreadyConnected`] when a handle for `id`
    /// exists, or the connector's error when opening fails.
    pub fn connect(
        &self,
        id: &SwitchId,
        interface: InterfaceType,
        baud: Option<u32>,
    ) -> Result<SwitchModel, DeviceError> {
        let mut handles = self.lock()?;
        if handles.contains_key(id) {
            return Err(DeviceError::AlreadyConnected { id: id.clone() });
        }
        let handle = self.connector.open(id, interface, baud)?;
        let model = handle.model();
        handles.insert(id.clone(), handle);
        info!(
            target: REGISTRY_TARGET,
            switch = %id,
            %model,
            interface = interface.as_str(),
            "switch connected"
        );
        Ok(model)
    }

    /// Closes and removes the handle for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NotConnected`] when no handle exists.
    pub fn disconnect(&self, id: &SwitchId) -> Result<(), DeviceError> {
        let mut handle = self
            .lock()?
            .remove(id)
            .ok_or_else(|| DeviceError::NotConnected { id: id.clone() })?;
        handle.close();
        info!(target: REGISTRY_TARGET, switch = %id, "switch disconnected");
        Ok(())
    }

    /// Whether a handle for `id` is open.
    #[must_use]
    pub fn is_connected(&self, id: &SwitchId) -> bool {
        self.lock().is_ok_and(|handles| handles.contains_key(id))
    }

    /// Identifiers of every open handle, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Internal`] when the registry lock is poisoned.
    pub fn connected(&self) -> Result<Vec<SwitchId>, DeviceError> {
        let mut ids: Vec<SwitchId> = self.lock()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Model of the connected switch.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NotConnected`] when no handle exists.
    pub fn model(&self, id: &SwitchId) -> Result<SwitchModel, DeviceError> {
        self.with_handle(id, |handle| Ok(handle.model()))
    }

    /// Connects `port` on the switch; `0` disconnects every port.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::UnsupportedPort`] when the model has no such
    /// port, [`DeviceError::NotConnected`] when no handle exists, or the
    /// handle's error.
    pub fn set_port(&self, id: &SwitchId, port: u8) -> Result<String, DeviceError> {
        self.with_handle(id, |handle| {
            let model = handle.model();
            if !model.accepts_port(port) {
                return Err(DeviceError::UnsupportedPort {
                    id: id.clone(),
                    model,
                    port,
                });
            }
            debug!(target: REGISTRY_TARGET, switch = %id, port, "setting port");
            handle.set_port(port)
        })
    }

    /// Selects the SuperSpeed mode on the switch.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::UnsupportedSpeed`] when the model has no
    /// SuperSpeed control, [`DeviceError::NotConnected`] when no handle
    /// exists, or the handle's error.
    pub fn set_speed(&self, id: &SwitchId, mode: SpeedMode) -> Result<String, DeviceError> {
        self.with_handle(id, |handle| {
            let model = handle.model();
            if !model.supports_speed() {
                return Err(DeviceError::UnsupportedSpeed {
                    id: id.clone(),
                    model,
                    mode,
                });
            }
            debug!(target: REGISTRY_TARGET, switch = %id, %mode, "setting speed");
            handle.set_speed(mode)
        })
    }

    /// Reads `parameter` from the switch.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::UnsupportedParameter`] for measurements on
    /// models without them, [`DeviceError::NotConnected`] when no handle
    /// exists, or the handle's error.
    pub fn read(&self, id: &SwitchId, parameter: ReadParameter) -> Result<String, DeviceError> {
        self.with_handle(id, |handle| {
            let model = handle.model();
            if parameter.is_measurement() && !model.supports_measurements() {
                return Err(DeviceError::UnsupportedParameter {
                    id: id.clone(),
                    model,
                    parameter,
                });
            }
            handle.read(parameter)
        })
    }

    /// Reads the active port and speed.
    ///
    /// # Errors
    ///
    /// See [`DeviceRegistry::read`].
    pub fn status(&self, id: &SwitchId) -> Result<String, DeviceError> {
        self.read(id, ReadParameter::Status)
    }

    /// Reads the bus voltage.
    ///
    /// # Errors
    ///
    /// See [`DeviceRegistry::read`].
    pub fn volts(&self, id: &SwitchId) -> Result<String, DeviceError> {
        self.read(id, ReadParameter::Volts)
    }

    /// Reads the bus current.
    ///
    /// # Errors
    ///
    /// See [`DeviceRegistry::read`].
    pub fn amps(&self, id: &SwitchId) -> Result<String, DeviceError> {
        self.read(id, ReadParameter::Amps)
    }

    /// Lists attached switches, flagging those with an open handle.
    ///
    /// The connector is queried without holding the registry lock.
    ///
    /// # Errors
    ///
    /// Returns the connector's discovery error.
    pub fn discover(&self) -> Result<Vec<DeviceListing>, DeviceError> {
        let mut listings = self.connector.discover()?;
        let handles = self.lock()?;
        for listing in &mut listings {
            listing.connected = handles.contains_key(&listing.id);
        }
        debug!(target: REGISTRY_TARGET, count = listings.len(), "discovery finished");
        Ok(listings)
    }

    fn with_handle<R>(
        &self,
        id: &SwitchId,
        operation: impl FnOnce(&mut dyn DeviceHandle) -> Result<R, DeviceError>,
    ) -> Result<R, DeviceError> {
        let mut handles = self.lock()?;
        let handle = handles
            .get_mut(id)
            .ok_or_else(|| DeviceError::NotConnected { id: id.clone() })?;
        operation(handle.as_mut())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SwitchId, Box<dyn DeviceHandle>>>, DeviceError> {
        self.handles
            .lock()
            .map_err(|_| DeviceError::internal("device registry lock poisoned"))
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DeviceRegistry")
            .field("connected", &self.connected().unwrap_or_default())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
