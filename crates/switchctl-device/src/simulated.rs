//! In-memory switches.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use switchctl_protocol::{InterfaceType, SUCCESS};

use crate::error::DeviceError;
use crate::handle::{DeviceConnector, DeviceHandle, DeviceListing};
use crate::model::{ReadParameter, SpeedMode, SwitchId, SwitchModel};

/// Observable state of a simulated switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchSnapshot {
    /// Switch model.
    pub model: SwitchModel,
    /// Active port, `0` when every port is off.
    pub port: u8,
    /// Selected SuperSpeed mode.
    pub speed: SpeedMode,
    /// Whether the switch answers commands.
    pub responsive: bool,
    /// Whether a handle is open.
    pub open: bool,
}

impl SwitchSnapshot {
    const fn fresh(model: SwitchModel) -> Self {
        Self {
            model,
            port: 0,
            speed: SpeedMode::Ss1,
            responsive: true,
            open: false,
        }
    }
}

type SharedState = Arc<Mutex<BTreeMap<SwitchId, SwitchSnapshot>>>;

/// Connector producing [`SimulatedSwitch`] handles.
///
/// A connector built with [`SimulatedConnector::permissive`] accepts any
/// identifier and treats it as the given model; otherwise only identifiers
/// registered up front can be opened.
#[derive(Debug, Clone, Default)]
pub struct SimulatedConnector {
    state: SharedState,
    fallback_model: Option<SwitchModel>,
}

impl SimulatedConnector {
    /// Connector knowing exactly the listed switches.
    #[must_use]
    pub fn with_switches(switches: impl IntoIterator<Item = (SwitchId, SwitchModel)>) -> Self {
        let state = switches
            .into_iter()
            .map(|(id, model)| (id, SwitchSnapshot::fresh(model)))
            .collect();
        Self {
            state: Arc::new(Mutex::new(state)),
            fallback_model: None,
        }
    }

    /// Connector accepting any identifier as a switch of `model`.
    #[must_use]
    pub fn permissive(model: SwitchModel) -> Self {
        Self {
            state: SharedState::default(),
            fallback_model: Some(model),
        }
    }

    /// Current state of `id`, if the connector knows it.
    #[must_use]
    pub fn snapshot(&self, id: &SwitchId) -> Option<SwitchSnapshot> {
        self.state.lock().ok()?.get(id).copied()
    }

    /// Makes `id` stop (or resume) answering commands.
    pub fn set_responsive(&self, id: &SwitchId, responsive: bool) {
        if let Ok(mut state) = self.state.lock()
            && let Some(snapshot) = state.get_mut(id)
        {
            snapshot.responsive = responsive;
        }
    }
}

impl DeviceConnector for SimulatedConnector {
    fn open(
        &self,
        id: &SwitchId,
        _interface: InterfaceType,
        _baud: Option<u32>,
    ) -> Result<Box<dyn DeviceHandle>, DeviceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DeviceError::internal("simulated switch state poisoned"))?;
        if !state.contains_key(id) {
            let model = self
                .fallback_model
                .ok_or_else(|| DeviceError::open(id.clone(), "no such device"))?;
            state.insert(id.clone(), SwitchSnapshot::fresh(model));
        }
        let snapshot = state
            .get_mut(id)
            .ok_or_else(|| DeviceError::open(id.clone(), "no such device"))?;
        if !snapshot.responsive {
            return Err(DeviceError::NoResponse { id: id.clone() });
        }
        snapshot.open = true;
        Ok(Box::new(SimulatedSwitch {
            id: id.clone(),
            model: snapshot.model,
            state: Arc::clone(&self.state),
        }))
    }

    fn discover(&self) -> Result<Vec<DeviceListing>, DeviceError> {
        let state = self
            .state
            .lock()
            .map_err(|_| DeviceError::Discovery {
                message: "simulated switch state poisoned".to_owned(),
            })?;
        Ok(state
            .iter()
            .map(|(id, snapshot)| DeviceListing {
                id: id.clone(),
                model: Some(snapshot.model),
                interface: InterfaceType::Serial,
                connected: snapshot.open,
            })
            .collect())
    }
}

/// Handle to one simulated switch.
#[derive(Debug)]
pub struct SimulatedSwitch {
    id: SwitchId,
    model: SwitchModel,
    state: SharedState,
}

impl SimulatedSwitch {
    fn update<R>(
        &self,
        operation: impl FnOnce(&mut SwitchSnapshot) -> R,
    ) -> Result<R, DeviceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DeviceError::internal("simulated switch state poisoned"))?;
        let snapshot = state
            .get_mut(&self.id)
            .filter(|snapshot| snapshot.responsive)
            .ok_or_else(|| DeviceError::NoResponse {
                id: self.id.clone(),
            })?;
        Ok(operation(snapshot))
    }
}

impl DeviceHandle for SimulatedSwitch {
    fn model(&self) -> SwitchModel {
        self.model
    }

    fn set_port(&mut self, port: u8) -> Result<String, DeviceError> {
        self.update(|snapshot| snapshot.port = port)?;
        Ok(SUCCESS.to_owned())
    }

    fn set_speed(&mut self, mode: SpeedMode) -> Result<String, DeviceError> {
        self.update(|snapshot| snapshot.speed = mode)?;
        Ok(SUCCESS.to_owned())
    }

    fn read(&mut self, parameter: ReadParameter) -> Result<String, DeviceError> {
        let model = self.model;
        self.update(|snapshot| {
            let powered = snapshot.port != 0;
            match parameter {
                ReadParameter::Status => format!("p{} {}", snapshot.port, snapshot.speed),
                ReadParameter::Volts => (if powered { "5.00" } else { "0.00" }).to_owned(),
                ReadParameter::Amps => (if powered { "0.100" } else { "0.000" }).to_owned(),
                ReadParameter::Version => format!("simulated-{model}"),
            }
        })
    }

    fn close(&mut self) {
        if let Ok(mut state) = self.state.lock()
            && let Some(snapshot) = state.get_mut(&self.id)
        {
            snapshot.open = false;
        }
    }
}
