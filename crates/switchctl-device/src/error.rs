//! Errors raised by the device registry and its handles.

use thiserror::Error;

use switchctl_protocol::ErrorKind;

use crate::model::{ReadParameter, SpeedMode, SwitchId, SwitchModel};

/// Errors surfaced by device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No handle is open for the switch.
    #[error("switch {id} is not connected")]
    NotConnected { id: SwitchId },

    /// A handle is already open for the switch.
    #[error("switch {id} is already connected")]
    AlreadyConnected { id: SwitchId },

    /// The switch did not answer a command.
    #[error("switch {id} did not respond")]
    NoResponse { id: SwitchId },

    /// The requested port does not exist on the model.
    #[error("switch {id} (model {model}) has no port {port}")]
    UnsupportedPort {
        id: SwitchId,
        model: SwitchModel,
        port: u8,
    },

    /// The model cannot change SuperSpeed mode.
    #[error("switch {id} (model {model}) cannot select {mode}")]
    UnsupportedSpeed {
        id: SwitchId,
        model: SwitchModel,
        mode: SpeedMode,
    },

    /// The model cannot report the parameter.
    #[error("switch {id} (model {model}) cannot report {parameter}")]
    UnsupportedParameter {
        id: SwitchId,
        model: SwitchModel,
        parameter: ReadParameter,
    },

    /// Opening the switch failed.
    #[error("failed to open switch {id}: {message}")]
    Open { id: SwitchId, message: String },

    /// Enumerating attached switches failed.
    #[error("device discovery failed: {message}")]
    Discovery { message: String },

    /// Internal error (e.g., lock poisoned).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl DeviceError {
    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an open failure.
    pub fn open(id: SwitchId, message: impl Into<String>) -> Self {
        Self::Open {
            id,
            message: message.into(),
        }
    }

    /// Wire classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConnected { .. } => ErrorKind::NotConnected,
            Self::AlreadyConnected { .. } => ErrorKind::AlreadyConnected,
            Self::NoResponse { .. } => ErrorKind::NoResponse,
            Self::UnsupportedPort { .. }
            | Self::UnsupportedSpeed { .. }
            | Self::UnsupportedParameter { .. } => ErrorKind::Unsupported,
            Self::Open { .. } | Self::Discovery { .. } | Self::Internal { .. } => {
                ErrorKind::Device
            }
        }
    }
}
