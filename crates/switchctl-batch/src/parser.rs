//! Line-oriented parser for batch scripts.
//!
//! Each non-blank line holds one instruction whose first whitespace-delimited
//! token is the opcode. Lines starting with `#` are comments. Problems never
//! abort parsing: the offending line is dropped and a [`ParseWarning`] is
//! recorded on the resulting [`ParsedSequence`].

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use switchctl_device::{ReadParameter, SpeedMode, SwitchId, SwitchModel};

use crate::step::{AliasMap, BatchStep, SerialAction, SwitchBinding};

const PARSER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::parser");

/// Non-fatal problem found while parsing. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    /// `switch` line naming a model that is not supported.
    #[error("line {line}: unsupported switch model '{model}'")]
    UnsupportedModel { line: usize, model: String },

    /// `switch` line that is not `switch <alias> = "<path>" "<model>"`.
    #[error("line {line}: malformed switch declaration")]
    MalformedSwitch { line: usize },

    /// Alias declared a second time.
    #[error("line {line}: alias '{alias}' is already declared")]
    DuplicateAlias { line: usize, alias: String },

    /// Step instruction found before `main:`.
    #[error("line {line}: '{opcode}' before 'main:' is ignored")]
    StepBeforeMain { line: usize, opcode: String },

    /// Step naming an alias that was never declared.
    #[error("line {line}: unknown switch alias '{alias}'")]
    UnknownAlias { line: usize, alias: String },

    /// `port` line that is not `port <alias>.p<N> [SS0|SS1]`.
    #[error("line {line}: malformed port target '{target}'")]
    InvalidPort { line: usize, target: String },

    /// Port number beyond the model's port count.
    #[error("line {line}: switch '{alias}' (model {model}) has no port {port}")]
    PortOutOfRange {
        line: usize,
        alias: String,
        model: SwitchModel,
        port: u8,
    },

    /// Speed mode other than `SS0` or `SS1`.
    #[error("line {line}: invalid speed mode '{value}'")]
    InvalidSpeed { line: usize, value: String },

    /// Speed mode given for a model without SuperSpeed control.
    #[error("line {line}: switch '{alias}' (model {model}) has no speed control")]
    SpeedUnsupported {
        line: usize,
        alias: String,
        model: SwitchModel,
    },

    /// `delay` payload that is not a number of milliseconds.
    #[error("line {line}: invalid delay '{value}'")]
    InvalidDelay { line: usize, value: String },

    /// `read` line that is not `read <alias> <parameter>`.
    #[error("line {line}: malformed read instruction")]
    MalformedRead { line: usize },

    /// Unknown read parameter.
    #[error("line {line}: unknown read parameter '{value}'")]
    InvalidReadParameter { line: usize, value: String },

    /// `repeat` without exactly one positive count.
    #[error("line {line}: repeat takes exactly one positive count")]
    RepeatArguments { line: usize },

    /// `serial` line without a known action and a payload.
    #[error("line {line}: malformed serial instruction")]
    MalformedSerial { line: usize },
}

impl ParseWarning {
    /// Line the warning refers to.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::UnsupportedModel { line, .. }
            | Self::MalformedSwitch { line }
            | Self::DuplicateAlias { line, .. }
            | Self::StepBeforeMain { line, .. }
            | Self::UnknownAlias { line, .. }
            | Self::InvalidPort { line, .. }
            | Self::PortOutOfRange { line, .. }
            | Self::InvalidSpeed { line, .. }
            | Self::SpeedUnsupported { line, .. }
            | Self::InvalidDelay { line, .. }
            | Self::MalformedRead { line }
            | Self::InvalidReadParameter { line, .. }
            | Self::RepeatArguments { line }
            | Self::MalformedSerial { line } => *line,
        }
    }
}

/// Result of parsing a batch script.
///
/// Equality ignores warnings: two sequences are equal when they execute
/// identically.
#[derive(Debug, Clone)]
pub struct ParsedSequence {
    steps: Vec<BatchStep>,
    aliases: AliasMap,
    repeat_count: u32,
    required_switches: BTreeSet<SwitchId>,
    ended: bool,
    warnings: Vec<ParseWarning>,
}

impl PartialEq for ParsedSequence {
    fn eq(&self, other: &Self) -> bool {
        self.steps == other.steps
            && self.aliases == other.aliases
            && self.repeat_count == other.repeat_count
            && self.required_switches == other.required_switches
            && self.ended == other.ended
    }
}

impl Eq for ParsedSequence {}

impl ParsedSequence {
    /// Steps in script order.
    #[must_use]
    pub fn steps(&self) -> &[BatchStep] {
        &self.steps
    }

    /// Declared aliases.
    #[must_use]
    pub const fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Number of cycles to run; `1` unless a valid `repeat` was given.
    #[must_use]
    pub const fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// Switches addressed by at least one step.
    #[must_use]
    pub const fn required_switches(&self) -> &BTreeSet<SwitchId> {
        &self.required_switches
    }

    /// Whether the script contained `end`.
    #[must_use]
    pub const fn ended(&self) -> bool {
        self.ended
    }

    /// Problems found while parsing.
    #[must_use]
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Whether the sequence has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Renders the sequence as canonical script text.
    ///
    /// Parsing the output yields a sequence equal to `self`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.aliases.len() + self.steps.len() + 1);
        for (alias, binding) in self.aliases.iter() {
            lines.push(format!(
                "switch {alias} = \"{}\" \"{}\"",
                binding.id, binding.model
            ));
        }
        lines.push("main:".to_owned());

        let mut steps = self.steps.iter().peekable();
        while let Some(step) = steps.next() {
            let line = match step {
                BatchStep::Switch(alias) => {
                    let speed = steps.next_if(|next| matches!(next, BatchStep::Speed(_)));
                    let port = steps.next_if(|next| matches!(next, BatchStep::Port(_)));
                    match (speed, port) {
                        (Some(BatchStep::Speed(mode)), Some(BatchStep::Port(port))) => {
                            format!("port {alias}.p{port} {mode}")
                        }
                        (_, Some(BatchStep::Port(port))) => format!("port {alias}.p{port}"),
                        _ => format!("# switch {alias}"),
                    }
                }
                BatchStep::Speed(mode) => format!("# speed {mode}"),
                BatchStep::Port(port) => format!("# port p{port}"),
                BatchStep::Delay(milliseconds) => format!("delay {milliseconds}ms"),
                BatchStep::Read(alias, parameter) => format!("read {alias} {parameter}"),
                BatchStep::Repeat(count) => format!("repeat {count}"),
                BatchStep::Serial(action, payload) => format!("serial {action} {payload}"),
                BatchStep::End => "end".to_owned(),
            };
            lines.push(line);
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

/// Parses a batch script.
#[must_use]
pub fn parse(text: &str) -> ParsedSequence {
    let mut parser = Parser::default();
    for (index, raw) in text.lines().enumerate() {
        parser.parse_line(index + 1, raw.trim());
    }
    parser.finish()
}

#[derive(Default)]
struct Parser {
    steps: Vec<BatchStep>,
    aliases: AliasMap,
    repeat_count: Option<u32>,
    required_switches: BTreeSet<SwitchId>,
    ended: bool,
    warnings: Vec<ParseWarning>,
    in_main: bool,
}

impl Parser {
    fn finish(self) -> ParsedSequence {
        ParsedSequence {
            steps: self.steps,
            aliases: self.aliases,
            repeat_count: self.repeat_count.unwrap_or(1),
            required_switches: self.required_switches,
            ended: self.ended,
            warnings: self.warnings,
        }
    }

    fn parse_line(&mut self, line: usize, text: &str) {
        if text.is_empty() || text.starts_with('#') {
            return;
        }
        let (opcode, rest) = split_opcode(text);
        match opcode.to_ascii_lowercase().as_str() {
            "switch" => self.parse_switch(line, rest),
            "main:" => self.in_main = true,
            "port" => self.parse_port(line, rest),
            "delay" => self.parse_delay(line, rest),
            "read" => self.parse_read(line, rest),
            "repeat" => self.parse_repeat(line, rest),
            "serial" => self.parse_serial(line, rest),
            "end" => {
                self.ended = true;
                self.steps.push(BatchStep::End);
            }
            other => debug!(target: PARSER_TARGET, line, opcode = other, "ignoring unknown opcode"),
        }
    }

    fn warn(&mut self, warning: ParseWarning) {
        debug!(target: PARSER_TARGET, %warning, "parse warning");
        self.warnings.push(warning);
    }

    fn require_main(&mut self, line: usize, opcode: &str) -> bool {
        if !self.in_main {
            self.warn(ParseWarning::StepBeforeMain {
                line,
                opcode: opcode.to_owned(),
            });
        }
        self.in_main
    }

    fn binding(&mut self, line: usize, alias: &str) -> Option<SwitchBinding> {
        let binding = self.aliases.get(alias).cloned();
        if binding.is_none() {
            self.warn(ParseWarning::UnknownAlias {
                line,
                alias: alias.to_owned(),
            });
        }
        binding
    }

    fn parse_switch(&mut self, line: usize, rest: &str) {
        let Some((alias, declaration)) = rest.split_once('=') else {
            self.warn(ParseWarning::MalformedSwitch { line });
            return;
        };
        let alias = alias.trim();
        let words = split_words(declaration);
        let [path, model] = words.as_slice() else {
            self.warn(ParseWarning::MalformedSwitch { line });
            return;
        };
        if alias.is_empty() || alias.contains(char::is_whitespace) {
            self.warn(ParseWarning::MalformedSwitch { line });
            return;
        }
        let Ok(model) = model.parse::<SwitchModel>() else {
            self.warn(ParseWarning::UnsupportedModel {
                line,
                model: model.clone(),
            });
            return;
        };
        let id = SwitchId::new(path);
        if id.as_str().is_empty() {
            self.warn(ParseWarning::MalformedSwitch { line });
            return;
        }
        if !self.aliases.insert(alias, SwitchBinding { id, model }) {
            self.warn(ParseWarning::DuplicateAlias {
                line,
                alias: alias.to_owned(),
            });
        }
    }

    fn parse_port(&mut self, line: usize, rest: &str) {
        if !self.require_main(line, "port") {
            return;
        }
        let mut words = rest.split_whitespace();
        let (Some(target), speed, None) = (words.next(), words.next(), words.next()) else {
            self.warn(ParseWarning::InvalidPort {
                line,
                target: rest.to_owned(),
            });
            return;
        };
        let invalid_target = || ParseWarning::InvalidPort {
            line,
            target: target.to_owned(),
        };
        let Some((alias, port)) = target.rsplit_once('.') else {
            self.warn(invalid_target());
            return;
        };
        let Some(binding) = self.binding(line, alias) else {
            return;
        };
        let Some(port) = port
            .strip_prefix(['p', 'P'])
            .and_then(|digits| digits.parse::<u8>().ok())
        else {
            self.warn(invalid_target());
            return;
        };
        if !binding.model.accepts_port(port) {
            self.warn(ParseWarning::PortOutOfRange {
                line,
                alias: alias.to_owned(),
                model: binding.model,
                port,
            });
            return;
        }
        let speed = match speed {
            None => None,
            Some(value) => {
                let Ok(mode) = value.parse::<SpeedMode>() else {
                    self.warn(ParseWarning::InvalidSpeed {
                        line,
                        value: value.to_owned(),
                    });
                    return;
                };
                Some(mode)
            }
        };
        if speed.is_some() && !binding.model.supports_speed() {
            self.warn(ParseWarning::SpeedUnsupported {
                line,
                alias: alias.to_owned(),
                model: binding.model,
            });
            return;
        }

        self.steps.push(BatchStep::Switch(alias.to_owned()));
        if let Some(mode) = speed {
            self.steps.push(BatchStep::Speed(mode));
        }
        self.steps.push(BatchStep::Port(port));
        self.required_switches.insert(binding.id);
    }

    fn parse_delay(&mut self, line: usize, rest: &str) {
        if !self.require_main(line, "delay") {
            return;
        }
        let lowered = rest.to_ascii_lowercase();
        let digits = lowered.strip_suffix("ms").unwrap_or(&lowered).trim();
        match digits.parse::<u64>() {
            Ok(milliseconds) => self.steps.push(BatchStep::Delay(milliseconds)),
            Err(_) => self.warn(ParseWarning::InvalidDelay {
                line,
                value: rest.to_owned(),
            }),
        }
    }

    fn parse_read(&mut self, line: usize, rest: &str) {
        if !self.require_main(line, "read") {
            return;
        }
        let words: Vec<&str> = rest.split_whitespace().collect();
        let [alias, parameter] = words.as_slice() else {
            self.warn(ParseWarning::MalformedRead { line });
            return;
        };
        let Some(binding) = self.binding(line, alias) else {
            return;
        };
        let Ok(parameter) = parameter.parse::<ReadParameter>() else {
            self.warn(ParseWarning::InvalidReadParameter {
                line,
                value: (*parameter).to_owned(),
            });
            return;
        };
        self.steps
            .push(BatchStep::Read((*alias).to_owned(), parameter));
        self.required_switches.insert(binding.id);
    }

    fn parse_repeat(&mut self, line: usize, rest: &str) {
        let words: Vec<&str> = rest.split_whitespace().collect();
        match words.as_slice() {
            [count] => match count.parse::<u32>() {
                Ok(count) if count > 0 => {
                    self.repeat_count = Some(count);
                    self.steps.push(BatchStep::Repeat(count));
                }
                _ => self.warn(ParseWarning::RepeatArguments { line }),
            },
            _ => self.warn(ParseWarning::RepeatArguments { line }),
        }
    }

    fn parse_serial(&mut self, line: usize, rest: &str) {
        if !self.require_main(line, "serial") {
            return;
        }
        let (action, payload) = split_opcode(rest);
        match action.parse::<SerialAction>() {
            Ok(action) if !payload.is_empty() => {
                self.steps
                    .push(BatchStep::Serial(action, payload.to_owned()));
            }
            _ => self.warn(ParseWarning::MalformedSerial { line }),
        }
    }
}

fn split_opcode(text: &str) -> (&str, &str) {
    text.split_once(char::is_whitespace)
        .map_or((text, ""), |(opcode, rest)| (opcode, rest.trim()))
}

/// Splits on whitespace, keeping double-quoted runs together.
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut started = false;
    let mut quoted = false;
    for character in text.chars() {
        match character {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            blank if blank.is_whitespace() && !quoted => {
                if started {
                    words.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            other => {
                current.push(other);
                started = true;
            }
        }
    }
    if started {
        words.push(current);
    }
    words
}
