//! In-process ownership of USB switch handles.
//!
//! A [`DeviceRegistry`] maps each [`SwitchId`] to at most one open
//! [`DeviceHandle`]. Handles are produced by a [`DeviceConnector`], which is
//! the seam where real hardware drivers plug in. The registry is shared
//! between the batch executor and the request server's responder threads, so
//! every operation goes through its internal mutex.
//!
//! [`SimulatedConnector`] provides in-memory switches for tests and for
//! running the daemon without hardware.

mod error;
mod handle;
mod model;
mod registry;
mod simulated;

pub use error::DeviceError;
pub use handle::{DeviceConnector, DeviceHandle, DeviceListing};
pub use model::{
    ReadParameter, ReadParameterParseError, SpeedMode, SpeedModeParseError, SwitchId,
    SwitchModel, SwitchModelParseError,
};
pub use registry::DeviceRegistry;
pub use simulated::{SimulatedConnector, SimulatedSwitch, SwitchSnapshot};

/// Tracing target for registry operations.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");
