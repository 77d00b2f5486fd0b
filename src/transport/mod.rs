//! Transport layer for device communication.
//!
//! This module provides the abstractions the monitor drives: a [`Channel`]
//! that reads from one open endpoint, and a [`Discovery`] source that lists
//! the endpoints currently visible. Only USB/Serial is implemented.

pub mod discovery;
pub mod serial;

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::SerialEndpoint;

/// Trait for read channels.
///
/// A channel starts closed, is opened once per monitor run and is closed on
/// every exit path.
pub trait Channel: Send {
    /// Opens the endpoint. Opening an already open channel is a no-op.
    fn open(&mut self, endpoint: &SerialEndpoint, baud_rate: u32) -> Result<()>;

    /// Returns true if bytes are waiting to be read. Never blocks.
    fn has_data(&mut self) -> Result<bool>;

    /// Reads the bytes currently pending. May return an empty buffer.
    fn read_available(&mut self) -> BoxFuture<'_, Result<Bytes>>;

    /// Releases the connection.
    ///
    /// Returns true if an open connection was released. Safe to call any
    /// number of times, including on a channel that was never opened.
    fn close(&mut self) -> bool;

    /// Returns true if open.
    fn is_open(&self) -> bool;
}

/// Source of the endpoints currently visible to the system.
pub trait Discovery {
    /// Enumerates the visible endpoints, in system order.
    fn endpoints(&self) -> Result<Vec<SerialEndpoint>>;
}

pub use discovery::{DEFAULT_KEYWORDS, Resolver};
pub use serial::{SerialChannel, SerialConfig, SystemPorts};
