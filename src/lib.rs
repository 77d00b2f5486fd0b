//! # battmon
//!
//! Turns the debug console of a ZMK keyboard running the battery LED module
//! into structured battery and LED telemetry.
//!
//! ## Features
//!
//! - Automatic discovery of the keyboard's serial port
//! - Line framing that survives fragmented reads and garbled bytes
//! - Ordered classification of battery, voltage, LED and lifecycle lines
//! - Cooperative cancellation with guaranteed port release
//!
//! ## Quick Start
//!
//! ```no_run
//! use battmon::{Monitor, MonitorConfig, Renderer, Resolver, SerialChannel, SystemPorts};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), battmon::Error> {
//!     let cancel = CancellationToken::new();
//!     let mut channel = SerialChannel::default();
//!     let mut monitor = Monitor::new(
//!         MonitorConfig::new(),
//!         Resolver::default(),
//!         Renderer::default(),
//!         std::io::stdout(),
//!     );
//!
//!     let report = monitor.run(&mut channel, &SystemPorts, None, &cancel).await?;
//!     println!("{} events", report.events);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`transport`] - Port discovery and the serial channel
//! - [`protocol`] - Line framing and pattern classification
//! - [`event`] - Classified events
//! - [`render`] - Terminal formatting and the battery bar
//! - [`monitor`] - The polling loop tying it together

pub mod error;
pub mod event;
pub mod monitor;
pub mod protocol;
pub mod render;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use error::{Error, Result};
pub use event::{ClassifiedEvent, Event};
pub use monitor::{Monitor, MonitorConfig, MonitorReport, MonitorState};
pub use protocol::{LineFramer, PatternKind, classify};
pub use render::{BatteryBar, Glyphs, Renderer, Tier};
pub use transport::serial::{DEFAULT_BAUD_RATE, list_endpoints};
pub use transport::{Channel, Discovery, Resolver, SerialChannel, SerialConfig, SystemPorts};
pub use types::SerialEndpoint;
