//! Steps and switch aliases produced by the parser.

use switchctl_device::{ReadParameter, SpeedMode, SwitchId, SwitchModel};

/// Serial console action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SerialAction {
    /// Open a serial port: payload is `<path> [baud]`.
    Open,
    /// Write the payload to the console.
    Write,
    /// Wait for the payload to appear on the console.
    Read,
}

/// One executable instruction of a batch sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStep {
    /// Select the switch that later `Speed` and `Port` steps address.
    Switch(String),
    /// Select SuperSpeed mode on the current switch.
    Speed(SpeedMode),
    /// Connect a port on the current switch; `0` turns every port off.
    Port(u8),
    /// Wait this many milliseconds.
    Delay(u64),
    /// Read a parameter back from the aliased switch.
    Read(String, ReadParameter),
    /// Marker recording the requested cycle count.
    Repeat(u32),
    /// Serial console action.
    Serial(SerialAction, String),
    /// Marker recording an explicit end of script.
    End,
}

impl BatchStep {
    /// Whether the step takes part in the safety check.
    #[must_use]
    pub const fn is_switching(&self) -> bool {
        matches!(self, Self::Switch(_) | Self::Port(_) | Self::Delay(_))
    }
}

/// Switch bound to an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchBinding {
    /// Switch identifier.
    pub id: SwitchId,
    /// Switch model.
    pub model: SwitchModel,
}

/// Aliases in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: Vec<(String, SwitchBinding)>,
}

impl AliasMap {
    /// Binds `alias`. Returns `false`, leaving the map unchanged, when the
    /// alias is already bound.
    pub(crate) fn insert(&mut self, alias: &str, binding: SwitchBinding) -> bool {
        if self.get(alias).is_some() {
            return false;
        }
        self.entries.push((alias.to_owned(), binding));
        true
    }

    /// Binding for `alias`.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&SwitchBinding> {
        self.entries
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, binding)| binding)
    }

    /// Aliases and bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SwitchBinding)> {
        self.entries
            .iter()
            .map(|(alias, binding)| (alias.as_str(), binding))
    }

    /// Number of aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no alias is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
