//! Classified telemetry events.
//!
//! A line that matches one of the classifier rules becomes an [`Event`]
//! carrying the fields extracted from it. The monitor stamps it with the wall
//! clock time, producing a [`ClassifiedEvent`] for the renderer.

use chrono::{DateTime, Local};

use crate::protocol::PatternKind;

/// Event types produced by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Start of a battery status block.
    BatteryStatusHeader,
    /// Current charge. Not range checked.
    BatteryLevel { percent: u32 },
    /// Current voltage as printed by the device.
    BatteryVoltage { millivolts: u32, volts: f64 },
    /// LED state.
    LedStatus { color: String, level: String },
    /// Battery LED module started.
    ModuleStart,
    /// Charge at boot.
    InitialLevel { percent: u32 },
    /// Voltage at boot.
    InitialVoltage { millivolts: u32 },
    /// LED pin assignment, the full line as received.
    LedPinsHeader { line: String },
}

impl Event {
    /// Returns the rule kind that produced this event.
    #[must_use]
    pub const fn kind(&self) -> PatternKind {
        match self {
            Self::BatteryStatusHeader => PatternKind::BatteryStatusHeader,
            Self::BatteryLevel { .. } => PatternKind::BatteryLevel,
            Self::BatteryVoltage { .. } => PatternKind::BatteryVoltage,
            Self::LedStatus { .. } => PatternKind::LedStatus,
            Self::ModuleStart => PatternKind::ModuleStart,
            Self::InitialLevel { .. } => PatternKind::InitialLevel,
            Self::InitialVoltage { .. } => PatternKind::InitialVoltage,
            Self::LedPinsHeader { .. } => PatternKind::LedPinsHeader,
        }
    }

    /// Returns the voltage in volts.
    ///
    /// Explicit readings report the device's own value; boot readings only
    /// carry millivolts, so volts are derived from them.
    #[must_use]
    pub fn volts(&self) -> Option<f64> {
        match self {
            Self::BatteryVoltage { volts, .. } => Some(*volts),
            Self::InitialVoltage { millivolts } => Some(f64::from(*millivolts) / 1000.0),
            _ => None,
        }
    }
}

/// An event together with the time it was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEvent {
    /// The classified event.
    pub event: Event,
    /// Local wall-clock time at classification.
    pub observed_at: DateTime<Local>,
}

impl ClassifiedEvent {
    /// Wraps an event with an explicit observation time.
    #[must_use]
    pub const fn new(event: Event, observed_at: DateTime<Local>) -> Self {
        Self { event, observed_at }
    }

    /// Wraps an event observed now.
    #[must_use]
    pub fn now(event: Event) -> Self {
        Self::new(event, Local::now())
    }

    /// Returns the rule kind that produced this event.
    #[must_use]
    pub const fn kind(&self) -> PatternKind {
        self.event.kind()
    }
}
