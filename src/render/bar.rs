//! Battery level bar.
//!
//! ```text
//! 45% -> [🟨🟨🟨🟨⬜⬜⬜⬜⬜⬜]
//! ```

use crate::render::glyphs::Glyphs;

/// Number of segments in a full bar.
pub const SEGMENTS: usize = 10;

/// Color band of a battery level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Above 80%.
    High,
    /// 61% to 80%.
    Good,
    /// 31% to 60%.
    Medium,
    /// 30% and below.
    Low,
}

impl Tier {
    /// Selects the band for a percentage. Boundaries belong to the lower band.
    #[must_use]
    pub const fn from_percent(percent: u32) -> Self {
        if percent > 80 {
            Self::High
        } else if percent > 60 {
            Self::Good
        } else if percent > 30 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Segment counts and band for a battery level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryBar {
    /// Filled segments.
    pub filled: usize,
    /// Empty segments.
    pub empty: usize,
    /// Color band of the filled segments.
    pub tier: Tier,
}

impl BatteryBar {
    /// Computes the bar for a percentage, clamped to 100.
    #[must_use]
    pub const fn from_percent(percent: u32) -> Self {
        let percent = if percent > 100 { 100 } else { percent };
        let filled = (percent / 10) as usize;
        Self {
            filled,
            empty: SEGMENTS - filled,
            tier: Tier::from_percent(percent),
        }
    }

    /// Draws the bar with the given glyphs.
    #[must_use]
    pub fn draw(&self, glyphs: &Glyphs) -> String {
        format!(
            "[{}{}]",
            glyphs.tier(self.tier).repeat(self.filled),
            glyphs.empty_segment.repeat(self.empty)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_always_sum_to_ten() {
        for percent in 0..=100 {
            let bar = BatteryBar::from_percent(percent);
            assert_eq!(bar.filled, (percent / 10) as usize);
            assert_eq!(bar.empty, SEGMENTS - (percent / 10) as usize);
            assert_eq!(bar.filled + bar.empty, SEGMENTS);
        }
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::from_percent(100), Tier::High);
        assert_eq!(Tier::from_percent(81), Tier::High);
        assert_eq!(Tier::from_percent(80), Tier::Good);
        assert_eq!(Tier::from_percent(61), Tier::Good);
        assert_eq!(Tier::from_percent(60), Tier::Medium);
        assert_eq!(Tier::from_percent(31), Tier::Medium);
        assert_eq!(Tier::from_percent(30), Tier::Low);
        assert_eq!(Tier::from_percent(0), Tier::Low);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let bar = BatteryBar::from_percent(250);
        assert_eq!(bar.filled, SEGMENTS);
        assert_eq!(bar.empty, 0);
        assert_eq!(bar.tier, Tier::High);
        assert_eq!(bar, BatteryBar::from_percent(100));
    }

    #[test]
    fn test_draw_45_percent() {
        let bar = BatteryBar::from_percent(45);
        assert_eq!(bar.tier, Tier::Medium);
        assert_eq!(bar.draw(&Glyphs::default()), "[🟨🟨🟨🟨⬜⬜⬜⬜⬜⬜]");
        assert_eq!(bar.draw(&Glyphs::ascii()), "[++++......]");
    }

    #[test]
    fn test_draw_empty_and_full() {
        let glyphs = Glyphs::default();
        assert_eq!(BatteryBar::from_percent(9).draw(&glyphs), "[⬜⬜⬜⬜⬜⬜⬜⬜⬜⬜]");
        assert_eq!(BatteryBar::from_percent(100).draw(&glyphs), "[🟩🟩🟩🟩🟩🟩🟩🟩🟩🟩]");
    }
}
