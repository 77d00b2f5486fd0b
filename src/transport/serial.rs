//! Serial/USB transport implementation.
//!
//! This module provides the serial port channel the monitor reads device
//! logs from, and the system port enumeration used for discovery.

use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use tokio::io::AsyncReadExt;
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialPortType, SerialStream};

use crate::error::{Error, Result};
use crate::transport::{Channel, Discovery};
use crate::types::SerialEndpoint;

/// Default baud rate for ZMK debug consoles.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default upper bound for a single read.
pub const DEFAULT_READ_CHUNK: usize = 1024;

/// Configuration for serial channels.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Maximum bytes taken per read.
    pub read_chunk: usize,
    /// RTS line level after opening.
    pub request_to_send: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            read_chunk: DEFAULT_READ_CHUNK,
            request_to_send: false,
        }
    }
}

impl SerialConfig {
    /// Creates a new serial configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum read size.
    #[must_use]
    pub const fn read_chunk(mut self, size: usize) -> Self {
        self.read_chunk = size;
        self
    }

    /// Sets the RTS level applied after opening.
    #[must_use]
    pub const fn request_to_send(mut self, level: bool) -> Self {
        self.request_to_send = level;
        self
    }
}

/// Serial channel backed by a `tokio-serial` stream.
pub struct SerialChannel {
    config: SerialConfig,
    stream: Option<SerialStream>,
    port: Option<String>,
}

impl SerialChannel {
    /// Creates a closed channel with the given configuration.
    #[must_use]
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            stream: None,
            port: None,
        }
    }

    fn pending(stream: &SerialStream) -> Result<usize> {
        let pending = stream.bytes_to_read().map_err(Error::Serial)?;
        Ok(pending as usize)
    }
}

impl Default for SerialChannel {
    fn default() -> Self {
        Self::new(SerialConfig::default())
    }
}

impl Channel for SerialChannel {
    fn open(&mut self, endpoint: &SerialEndpoint, baud_rate: u32) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        tracing::info!("opening serial port: {} @ {}", endpoint.id, baud_rate);

        let mut stream = tokio_serial::new(&endpoint.id, baud_rate)
            .open_native_async()
            .map_err(|e| Error::Connection {
                port: endpoint.id.clone(),
                reason: e.description,
            })?;

        if let Err(e) = stream.write_request_to_send(self.config.request_to_send) {
            tracing::warn!("failed to set RTS: {}", e);
        }

        self.stream = Some(stream);
        self.port = Some(endpoint.id.clone());
        Ok(())
    }

    fn has_data(&mut self) -> Result<bool> {
        let stream = self.stream.as_ref().ok_or(Error::NotConnected)?;
        Ok(Self::pending(stream)? > 0)
    }

    fn read_available(&mut self) -> BoxFuture<'_, Result<Bytes>> {
        let read_chunk = self.config.read_chunk;
        Box::pin(async move {
            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

            let pending = Self::pending(stream)?.min(read_chunk);
            if pending == 0 {
                return Ok(Bytes::new());
            }

            let mut buf = BytesMut::zeroed(pending);
            let n = stream.read(&mut buf).await.map_err(Error::Io)?;
            buf.truncate(n);

            tracing::trace!("received {} bytes", n);
            Ok(buf.freeze())
        })
    }

    fn close(&mut self) -> bool {
        let closed = self.stream.take().is_some();
        if let Some(port) = self.port.take() {
            tracing::info!("closed serial port: {}", port);
        }
        closed
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for SerialChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Enumerates the ports the operating system currently exposes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl Discovery for SystemPorts {
    fn endpoints(&self) -> Result<Vec<SerialEndpoint>> {
        list_endpoints()
    }
}

/// Lists available serial ports with their descriptors.
///
/// # Errors
///
/// Returns an error if the port list cannot be retrieved.
pub fn list_endpoints() -> Result<Vec<SerialEndpoint>> {
    let ports = tokio_serial::available_ports().map_err(Error::Serial)?;
    Ok(ports
        .into_iter()
        .map(|p| SerialEndpoint::new(p.port_name, describe(&p.port_type)))
        .collect())
}

/// Builds a human readable descriptor for a port type.
fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(info) => {
            let parts: Vec<&str> = [info.product.as_deref(), info.manufacturer.as_deref()]
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
                .collect();
            if parts.is_empty() {
                "USB Serial Device".to_string()
            } else {
                parts.join(" ")
            }
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "n/a".to_string(),
    }
}
