//! Identifiers and capabilities of supported switches.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a physical switch, such as `COM7` or `/dev/ttyACM0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchId(String);

impl SwitchId {
    /// Wraps an identifier, trimming surrounding whitespace.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_owned())
    }

    /// Borrowed identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for SwitchId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Supported switch models.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
pub enum SwitchModel {
    /// Type-C 2:1 switch with SuperSpeed control.
    #[strum(serialize = "3141")]
    #[serde(rename = "3141")]
    M3141,
    /// Type-C 3.2 2:1 switch with SuperSpeed control.
    #[strum(serialize = "3142")]
    #[serde(rename = "3142")]
    M3142,
    /// Type-C connection exerciser.
    #[strum(serialize = "3201")]
    #[serde(rename = "3201")]
    M3201,
    /// USB 2.0 four-port switch.
    #[strum(serialize = "2101")]
    #[serde(rename = "2101")]
    M2101,
    /// USB 3.0 connection exerciser.
    #[strum(serialize = "2301")]
    #[serde(rename = "2301")]
    M2301,
}

impl SwitchModel {
    /// Every supported model.
    pub const ALL: [Self; 5] = [Self::M3141, Self::M3142, Self::M3201, Self::M2101, Self::M2301];

    /// Number of switchable ports. Port `0` (all off) is always valid.
    #[must_use]
    pub const fn port_count(self) -> u8 {
        match self {
            Self::M3141 | Self::M3142 => 2,
            Self::M3201 | Self::M2301 => 1,
            Self::M2101 => 4,
        }
    }

    /// Whether the model can enable and disable SuperSpeed lines.
    #[must_use]
    pub const fn supports_speed(self) -> bool {
        !matches!(self, Self::M2101)
    }

    /// Whether the model reports bus voltage and current.
    #[must_use]
    pub const fn supports_measurements(self) -> bool {
        matches!(self, Self::M3141 | Self::M3142 | Self::M3201)
    }

    /// Whether `port` is addressable on this model.
    #[must_use]
    pub const fn accepts_port(self, port: u8) -> bool {
        port <= self.port_count()
    }
}

/// Errors encountered while parsing a [`SwitchModel`].
pub type SwitchModelParseError = strum::ParseError;

/// SuperSpeed mode applied before switching a port.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[strum(ascii_case_insensitive)]
pub enum SpeedMode {
    /// SuperSpeed lines disconnected.
    #[strum(serialize = "SS0")]
    #[serde(rename = "SS0")]
    Ss0,
    /// SuperSpeed lines connected.
    #[strum(serialize = "SS1")]
    #[serde(rename = "SS1")]
    Ss1,
}

/// Errors encountered while parsing a [`SpeedMode`].
pub type SpeedModeParseError = strum::ParseError;

/// Parameters that can be read back from a switch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ReadParameter {
    /// Active port and speed.
    Status,
    /// Bus voltage.
    Volts,
    /// Bus current.
    Amps,
    /// Firmware version.
    Version,
}

impl ReadParameter {
    /// Whether reading this parameter needs measurement support.
    #[must_use]
    pub const fn is_measurement(self) -> bool {
        matches!(self, Self::Volts | Self::Amps)
    }
}

/// Errors encountered while parsing a [`ReadParameter`].
pub type ReadParameterParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("3141", SwitchModel::M3141)]
    #[case("3142", SwitchModel::M3142)]
    #[case("3201", SwitchModel::M3201)]
    #[case("2101", SwitchModel::M2101)]
    #[case("2301", SwitchModel::M2301)]
    fn parses_supported_models(#[case] input: &str, #[case] expected: SwitchModel) {
        assert_eq!(input.parse::<SwitchModel>().expect("parse model"), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[test]
    fn rejects_unknown_model() {
        assert!("9999".parse::<SwitchModel>().is_err());
    }

    #[rstest]
    #[case("SS0", SpeedMode::Ss0)]
    #[case("ss1", SpeedMode::Ss1)]
    fn parses_speed_modes(#[case] input: &str, #[case] expected: SpeedMode) {
        assert_eq!(input.parse::<SpeedMode>().expect("parse speed"), expected);
    }

    #[test]
    fn port_zero_is_always_accepted() {
        for model in SwitchModel::ALL {
            assert!(model.accepts_port(0), "{model} should accept port 0");
            assert!(!model.accepts_port(model.port_count() + 1));
        }
    }

    #[test]
    fn switch_ids_are_trimmed() {
        assert_eq!(SwitchId::new("  COM7 ").as_str(), "COM7");
    }
}
