//! Serial console used by `serial` steps.

use thiserror::Error;

/// Failure reported by a [`SerialConsole`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("serial console error: {message}")]
pub struct SerialError {
    message: String,
}

impl SerialError {
    /// Creates an error with a description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Console attached to the device under test.
///
/// Implementations live outside this crate; without one, every `serial`
/// step counts as a failure.
pub trait SerialConsole: Send + Sync {
    /// Opens the console at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the port cannot be opened.
    fn open(&self, path: &str, baud: Option<u32>) -> Result<(), SerialError>;

    /// Writes `text` followed by a line terminator.
    ///
    /// # Errors
    ///
    /// Returns an error when the console is closed or the write fails.
    fn write_line(&self, text: &str) -> Result<(), SerialError>;

    /// Whether `expected` appears in the console output.
    ///
    /// # Errors
    ///
    /// Returns an error when the console is closed or reading fails.
    fn expect(&self, expected: &str) -> Result<bool, SerialError>;
}
