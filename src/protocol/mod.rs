//! Text protocol of the device debug console.
//!
//! This module turns the raw console byte stream into typed events:
//! - Line framing with partial-data and encoding tolerance
//! - Ordered pattern classification with field extraction

pub mod frame;
pub mod pattern;

pub use frame::{LINE_TERMINATOR, LineFramer, Lines, MAX_LINE_LENGTH};
pub use pattern::{PatternKind, Rule, classify, rules};
