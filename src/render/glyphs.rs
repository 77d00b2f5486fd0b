//! Glyph tables.
//!
//! Category markers, battery bar segments and LED color dots. The tables are
//! plain data so a plain-text terminal can swap them out.

use crate::render::bar::Tier;

/// Glyph set used by the renderer.
#[derive(Debug, Clone)]
pub struct Glyphs {
    pub battery_update: &'static str,
    pub module_start: &'static str,
    pub level: &'static str,
    pub voltage: &'static str,
    pub led: &'static str,
    pub pins: &'static str,
    pub connected: &'static str,
    pub started_at: &'static str,
    pub listening: &'static str,
    pub stopped: &'static str,
    pub closed: &'static str,
    pub waiting: &'static str,
    pub relevant: &'static str,
    /// Filled segments for High, Good, Medium and Low.
    pub tiers: [&'static str; 4],
    pub empty_segment: &'static str,
    /// LED color names, upper case, and their glyph.
    pub led_colors: &'static [(&'static str, &'static str)],
    /// Glyph for LED colors missing from `led_colors`.
    pub unknown_color: &'static str,
}

const EMOJI_LED_COLORS: &[(&str, &str)] = &[
    ("GREEN", "🟢"),
    ("BLUE", "🔵"),
    ("YELLOW", "🟡"),
    ("RED", "🔴"),
];

const ASCII_LED_COLORS: &[(&str, &str)] = &[
    ("GREEN", "(G)"),
    ("BLUE", "(B)"),
    ("YELLOW", "(Y)"),
    ("RED", "(R)"),
];

impl Default for Glyphs {
    fn default() -> Self {
        Self {
            battery_update: "🔋",
            module_start: "🚀",
            level: "📊",
            voltage: "⚡",
            led: "💡",
            pins: "📌",
            connected: "✅",
            started_at: "📅",
            listening: "🎯",
            stopped: "⏹️",
            closed: "🔌",
            waiting: "⏱️",
            relevant: "⭐",
            tiers: ["🟩", "🟦", "🟨", "🟥"],
            empty_segment: "⬜",
            led_colors: EMOJI_LED_COLORS,
            unknown_color: "⚪",
        }
    }
}

impl Glyphs {
    /// Glyphs for terminals without emoji support.
    #[must_use]
    pub fn ascii() -> Self {
        Self {
            battery_update: "[BAT]",
            module_start: "[START]",
            level: "[LVL]",
            voltage: "[VOLT]",
            led: "[LED]",
            pins: "[PINS]",
            connected: "[OK]",
            started_at: "[TIME]",
            listening: "[WATCH]",
            stopped: "[STOP]",
            closed: "[CLOSE]",
            waiting: "[WAIT]",
            relevant: "*",
            tiers: ["#", "=", "+", "!"],
            empty_segment: ".",
            led_colors: ASCII_LED_COLORS,
            unknown_color: "(?)",
        }
    }

    /// Returns the filled segment glyph for a tier.
    #[must_use]
    pub const fn tier(&self, tier: Tier) -> &'static str {
        match tier {
            Tier::High => self.tiers[0],
            Tier::Good => self.tiers[1],
            Tier::Medium => self.tiers[2],
            Tier::Low => self.tiers[3],
        }
    }

    /// Looks up an LED color, ignoring case.
    ///
    /// Unknown colors get [`Glyphs::unknown_color`].
    #[must_use]
    pub fn led_color(&self, color: &str) -> &'static str {
        self.led_colors
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(color))
            .map_or(self.unknown_color, |&(_, glyph)| glyph)
    }
}
