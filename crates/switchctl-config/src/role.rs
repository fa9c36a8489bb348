use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Where switch commands are executed.
///
/// `Local` drives switches attached to this machine through the in-process
/// device registry. `Network` forwards every command to the Switch Control
/// Computer configured as the control endpoint.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    /// Switches are attached to this process.
    #[default]
    Local,
    /// Switches are owned by a remote Switch Control Computer.
    Network,
}

/// Errors encountered while parsing a [`Role`] from text.
pub type RoleParseError = strum::ParseError;
