//! Log line classification.
//!
//! The battery LED module prints a handful of recognisable lines. Each one is
//! described by a [`Rule`]; rules are tried in [`PatternKind`] declaration
//! order and the first rule that matches decides the event. Patterns are
//! searched anywhere in the line because the device prefixes every message
//! with its own uptime and module name.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::event::Event;

/// Rule names, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// Start of a battery status block.
    BatteryStatusHeader,
    /// Current charge in percent.
    BatteryLevel,
    /// Current voltage, in millivolts and volts.
    BatteryVoltage,
    /// LED color and level descriptor.
    LedStatus,
    /// The battery LED module finished booting.
    ModuleStart,
    /// Charge reported at boot.
    InitialLevel,
    /// Voltage reported at boot, millivolts only.
    InitialVoltage,
    /// LED pin assignment line.
    LedPinsHeader,
}

impl PatternKind {
    /// All kinds, in precedence order.
    pub const ALL: [Self; 8] = [
        Self::BatteryStatusHeader,
        Self::BatteryLevel,
        Self::BatteryVoltage,
        Self::LedStatus,
        Self::ModuleStart,
        Self::InitialLevel,
        Self::InitialVoltage,
        Self::LedPinsHeader,
    ];

    /// Returns the snake case name of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BatteryStatusHeader => "battery_status",
            Self::BatteryLevel => "battery_level",
            Self::BatteryVoltage => "battery_voltage",
            Self::LedStatus => "led_status",
            Self::ModuleStart => "module_start",
            Self::InitialLevel => "initial_level",
            Self::InitialVoltage => "initial_voltage",
            Self::LedPinsHeader => "led_pins",
        }
    }

    const fn pattern(self) -> &'static str {
        match self {
            Self::BatteryStatusHeader => r"(?:===|\*\*\*) BATTERY STATUS (?:===|\*\*\*)",
            Self::BatteryLevel => r"Battery level: (\d+)%",
            Self::BatteryVoltage => r"Battery voltage: (\d+) mV \(([\d.]+) V\)",
            Self::LedStatus => r"LED Status: (\w+) \((\w+)\)",
            Self::ModuleStart => r"(?:===|\*\*\*) BATTERY LED MODULE STARTED (?:===|\*\*\*)",
            Self::InitialLevel => r"Initial battery level: (\d+)%",
            Self::InitialVoltage => r"Initial battery voltage: (\d+) mV",
            Self::LedPinsHeader => r"LEDs configured on pins:",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named pattern with its field extractor.
#[derive(Debug)]
pub struct Rule {
    kind: PatternKind,
    regex: Regex,
}

impl Rule {
    fn new(kind: PatternKind) -> Self {
        Self {
            kind,
            // Patterns are fixed literals above; they always compile.
            regex: Regex::new(kind.pattern()).expect("built-in pattern is valid"),
        }
    }

    /// Returns the rule kind.
    #[must_use]
    pub const fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Matches the line and extracts this rule's fields.
    ///
    /// Returns `None` if the pattern does not match or a numeric field does
    /// not parse.
    #[must_use]
    pub fn apply(&self, line: &str) -> Option<Event> {
        let caps = self.regex.captures(line)?;
        match self.kind {
            PatternKind::BatteryStatusHeader => Some(Event::BatteryStatusHeader),
            PatternKind::BatteryLevel => Some(Event::BatteryLevel {
                percent: field(&caps, 1)?,
            }),
            PatternKind::BatteryVoltage => Some(Event::BatteryVoltage {
                millivolts: field(&caps, 1)?,
                volts: field(&caps, 2)?,
            }),
            PatternKind::LedStatus => Some(Event::LedStatus {
                color: caps[1].to_string(),
                level: caps[2].to_string(),
            }),
            PatternKind::ModuleStart => Some(Event::ModuleStart),
            PatternKind::InitialLevel => Some(Event::InitialLevel {
                percent: field(&caps, 1)?,
            }),
            PatternKind::InitialVoltage => Some(Event::InitialVoltage {
                millivolts: field(&caps, 1)?,
            }),
            PatternKind::LedPinsHeader => Some(Event::LedPinsHeader {
                line: line.to_string(),
            }),
        }
    }
}

fn field<T: FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    caps.get(index)?.as_str().parse().ok()
}

static RULES: LazyLock<Vec<Rule>> =
    LazyLock::new(|| PatternKind::ALL.into_iter().map(Rule::new).collect());

/// Returns the rule table, in precedence order.
#[must_use]
pub fn rules() -> &'static [Rule] {
    &RULES
}

/// Classifies a log line.
///
/// Returns the event of the first matching rule, or `None` if no rule
/// matches.
#[must_use]
pub fn classify(line: &str) -> Option<Event> {
    rules().iter().find_map(|rule| rule.apply(line))
}
