//! Display records for the terminal.
//!
//! [`Renderer`] turns classified events into the lines the monitor prints,
//! and formats the passthrough, banner and status lines around them.

pub mod bar;
pub mod glyphs;

use chrono::{DateTime, Local};

use crate::event::{ClassifiedEvent, Event};
use crate::types::SerialEndpoint;

pub use bar::{BatteryBar, SEGMENTS, Tier};
pub use glyphs::Glyphs;

/// Words that make a raw line worth highlighting.
pub const RELEVANT_KEYWORDS: &[&str] = &["battery", "led", "init"];

const BANNER_RULE_WIDTH: usize = 60;
const SECTION_RULE_WIDTH: usize = 50;

fn clock(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// Formats events and status lines.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    glyphs: Glyphs,
}

impl Renderer {
    /// Creates a renderer with the given glyphs.
    #[must_use]
    pub const fn new(glyphs: Glyphs) -> Self {
        Self { glyphs }
    }

    /// Returns the glyph set.
    #[must_use]
    pub const fn glyphs(&self) -> &Glyphs {
        &self.glyphs
    }

    /// Renders a classified event. May span several lines.
    #[must_use]
    pub fn render(&self, classified: &ClassifiedEvent) -> String {
        let g = &self.glyphs;
        let ts = clock(&classified.observed_at);

        match &classified.event {
            Event::BatteryStatusHeader => format!(
                "\n{} [{ts}] BATTERY UPDATE\n{}",
                g.battery_update,
                "-".repeat(SECTION_RULE_WIDTH)
            ),
            Event::BatteryLevel { percent } => format!(
                "{} [{ts}] Level: {percent}% {}",
                g.level,
                BatteryBar::from_percent(*percent).draw(g)
            ),
            Event::BatteryVoltage { millivolts, volts } => {
                format!("{} [{ts}] Voltage: {millivolts} mV ({volts:.2} V)", g.voltage)
            }
            Event::LedStatus { color, level } => format!(
                "{} [{ts}] LED: {} {color} ({level})",
                g.led,
                g.led_color(color)
            ),
            Event::ModuleStart => format!(
                "\n{} [{ts}] BATTERY MODULE STARTED\n{}",
                g.module_start,
                "=".repeat(SECTION_RULE_WIDTH)
            ),
            Event::InitialLevel { percent } => format!(
                "{} [{ts}] Initial level: {percent}% {}",
                g.level,
                BatteryBar::from_percent(*percent).draw(g)
            ),
            Event::InitialVoltage { millivolts } => {
                let volts = classified.event.volts().unwrap_or_default();
                format!(
                    "{} [{ts}] Initial voltage: {millivolts} mV ({volts:.2} V)",
                    g.voltage
                )
            }
            Event::LedPinsHeader { line } => format!("{} [{ts}] {line}", g.pins),
        }
    }

    /// Renders a raw line for passthrough mode, highlighting relevant ones.
    #[must_use]
    pub fn render_raw(&self, line: &str, at: &DateTime<Local>) -> String {
        let mut out = format!("[{}] {line}", at.format("%H:%M:%S%.3f"));
        if is_relevant(line) {
            out.push_str(&format!("\n    {} RELEVANT: {line}", self.glyphs.relevant));
        }
        out
    }

    /// Status line printed while passthrough mode waits for data.
    #[must_use]
    pub fn heartbeat(&self, at: &DateTime<Local>, lines: u64) -> String {
        format!(
            "{}  {} - waiting for data... (lines received: {lines})",
            self.glyphs.waiting,
            clock(at)
        )
    }

    /// Banner printed once the channel is open.
    #[must_use]
    pub fn connected(
        &self,
        endpoint: &SerialEndpoint,
        baud_rate: u32,
        raw: bool,
        at: &DateTime<Local>,
    ) -> String {
        let g = &self.glyphs;
        let rule = "=".repeat(BANNER_RULE_WIDTH);
        let what = if raw {
            "Showing ALL logs"
        } else {
            "Monitoring battery logs..."
        };
        format!(
            "{} Connected to {} @ {baud_rate} baud\n{} Started at {}\n{rule}\n{} {what}\nPress Ctrl+C to stop\n{rule}",
            g.connected,
            endpoint.id,
            g.started_at,
            clock(at),
            g.listening,
        )
    }

    /// Report printed when monitoring is cancelled.
    #[must_use]
    pub fn stopped(&self, at: &DateTime<Local>, lines: u64) -> String {
        format!(
            "\n\n{}  Monitoring stopped at {} ({lines} lines received)",
            self.glyphs.stopped,
            clock(at)
        )
    }

    /// Line printed after the channel is released.
    #[must_use]
    pub fn closed(&self) -> String {
        format!("{} Connection closed", self.glyphs.closed)
    }
}

/// Returns true if a raw line mentions battery, LED or init activity.
#[must_use]
pub fn is_relevant(line: &str) -> bool {
    let lower = line.to_lowercase();
    RELEVANT_KEYWORDS.iter().any(|k| lower.contains(k))
}
