//! Request envelope and the command vocabulary it carries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Request categories understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Device lifecycle: search, open, close.
    Device,
    /// Switch control: port, speed, status, measurements.
    Control,
}

impl Category {
    /// Parses a category string (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "device" => Some(Self::Device),
            "control" => Some(Self::Control),
            _ => None,
        }
    }

    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Control => "control",
        }
    }
}

/// Interface a switch is reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceType {
    /// Switch controlled over a serial port.
    Serial,
    /// Switch controlled over USB.
    Usb,
}

impl InterfaceType {
    /// Parses an interface type string (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "serial" => Some(Self::Serial),
            "usb" => Some(Self::Usb),
            _ => None,
        }
    }

    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Usb => "usb",
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Commands in the `device` category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Enumerate attached switches.
    Search,
    /// Open a switch handle.
    Open,
    /// Close a switch handle.
    Close,
}

impl DeviceCommand {
    /// Parses a device command name (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "search" => Some(Self::Search),
            "open" => Some(Self::Open),
            "close" => Some(Self::Close),
            _ => None,
        }
    }

    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

/// Named commands in the `control` category for serial switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Select a port (`stat` carries the port number, `0` for all off).
    Switch,
    /// Set the SuperSpeed mode (`stat` carries `SS0` or `SS1`).
    Speed,
    /// Read a named parameter (`stat` carries the parameter).
    Read,
    /// Report the switch status.
    Status,
    /// Read the bus voltage.
    Volts,
    /// Read the bus current.
    Amps,
}

impl ControlCommand {
    /// Parses a control command name (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "switch" => Some(Self::Switch),
            "speed" => Some(Self::Speed),
            "read" => Some(Self::Read),
            "status" => Some(Self::Status),
            "volts" => Some(Self::Volts),
            "amps" => Some(Self::Amps),
            _ => None,
        }
    }

    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Speed => "speed",
            Self::Read => "read",
            Self::Status => "status",
            Self::Volts => "volts",
            Self::Amps => "amps",
        }
    }
}

/// The `cmd` field: a command name or, for raw USB control, a port number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandToken {
    /// Raw port number.
    Number(i64),
    /// Named command.
    Name(String),
}

impl CommandToken {
    /// Returns the command name, if the token is textual.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name.as_str()),
            Self::Number(_) => None,
        }
    }

    /// Returns the port number carried by the token.
    ///
    /// Numeric strings are accepted because some peers send `"2"` rather
    /// than `2`.
    #[must_use]
    pub fn as_port_number(&self) -> Option<u8> {
        match self {
            Self::Number(number) => u8::try_from(*number).ok(),
            Self::Name(name) => name.trim().parse().ok(),
        }
    }
}

impl fmt::Display for CommandToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(formatter, "{number}"),
            Self::Name(name) => formatter.write_str(name),
        }
    }
}

/// Request sent from a client to the request server.
///
/// Fields are kept as received so the server can answer unknown categories
/// and commands with an explicit `Invalid command` payload rather than a
/// decode failure. Use the typed accessors to interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Request category (`device` or `control`).
    pub ctype: String,
    /// Command name or raw port number.
    pub cmd: CommandToken,
    /// Interface type (`serial` or `usb`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itype: Option<String>,
    /// Switch identifier, such as a serial port path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Serial baud rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baud: Option<String>,
    /// Command argument, such as the port to switch to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<String>,
}

impl Request {
    fn new(category: Category, cmd: CommandToken) -> Self {
        Self {
            ctype: category.as_str().to_owned(),
            cmd,
            itype: None,
            port: None,
            baud: None,
            stat: None,
        }
    }

    /// Builds a `device` request.
    #[must_use]
    pub fn device(command: DeviceCommand) -> Self {
        Self::new(
            Category::Device,
            CommandToken::Name(command.as_str().to_owned()),
        )
    }

    /// Builds a `control` request for a named command.
    #[must_use]
    pub fn control(interface: InterfaceType, command: ControlCommand) -> Self {
        Self::new(
            Category::Control,
            CommandToken::Name(command.as_str().to_owned()),
        )
        .with_interface(interface)
    }

    /// Builds a raw USB port-control request.
    #[must_use]
    pub fn usb_port(port_number: u8) -> Self {
        Self::new(Category::Control, CommandToken::Number(i64::from(port_number)))
            .with_interface(InterfaceType::Usb)
    }

    /// Sets the interface type.
    #[must_use]
    pub fn with_interface(mut self, interface: InterfaceType) -> Self {
        self.itype = Some(interface.as_str().to_owned());
        self
    }

    /// Sets the switch identifier.
    #[must_use]
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Sets the serial baud rate.
    #[must_use]
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = Some(baud.to_string());
        self
    }

    /// Sets the command argument.
    #[must_use]
    pub fn with_stat(mut self, stat: impl Into<String>) -> Self {
        self.stat = Some(stat.into());
        self
    }

    /// Typed category, if recognised.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        Category::parse(&self.ctype)
    }

    /// Typed interface type, if present and recognised.
    #[must_use]
    pub fn interface(&self) -> Option<InterfaceType> {
        self.itype.as_deref().and_then(InterfaceType::parse)
    }

    /// Switch identifier with surrounding whitespace removed.
    #[must_use]
    pub fn switch_id(&self) -> Option<&str> {
        self.port
            .as_deref()
            .map(str::trim)
            .filter(|port| !port.is_empty())
    }

    /// Baud rate, if present and numeric.
    #[must_use]
    pub fn baud_rate(&self) -> Option<u32> {
        self.baud.as_deref().and_then(|baud| baud.trim().parse().ok())
    }

    /// Command argument with surrounding whitespace removed.
    #[must_use]
    pub fn argument(&self) -> Option<&str> {
        self.stat.as_deref().map(str::trim)
    }
}
