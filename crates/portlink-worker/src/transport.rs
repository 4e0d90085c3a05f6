//! Transport seam between the supervisor and the physical device.
//!
//! The supervisor never names a concrete serial type: it drives a boxed
//! [`SerialDevice`] obtained from a [`DeviceOpener`]. Production links use
//! [`SystemOpener`], which opens a real port through the `serialport` crate;
//! tests substitute the scripted opener from the [`mock`](crate::mock)
//! module. The device handle lives exclusively on the supervisor thread.

use crate::error::{LinkError, Result};
use portlink_core::LinkConfig;
use std::io::{Read, Write};
use tracing::debug;

/// A connected serial device: blocking reads and writes, bounded by the
/// timeouts the device was opened with.
pub trait SerialDevice: Read + Write + Send {}

impl<T: Read + Write + Send + ?Sized> SerialDevice for T {}

/// Boxed device handle owned by the supervisor.
pub type Device = Box<dyn SerialDevice>;

/// Opens a device for the supervisor, once per connection attempt.
pub trait DeviceOpener: Send {
    /// Open the device described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the device cannot be opened; the supervisor
    /// treats this as a connection failure and retries after the configured
    /// reconnect delay.
    fn open(&mut self, config: &LinkConfig) -> Result<Device>;
}

/// Production opener backed by the `serialport` crate.
///
/// Ports are opened 8N1 at the configured baud rate. `serialport` exposes a
/// single operation timeout shared by reads and writes; it is set from
/// `read_timeout`, which therefore also bounds writes.
#[derive(Debug, Default)]
pub struct SystemOpener;

impl SystemOpener {
    /// Create a system opener.
    pub fn new() -> Self {
        Self
    }
}

impl DeviceOpener for SystemOpener {
    fn open(&mut self, config: &LinkConfig) -> Result<Device> {
        debug!(
            port = %config.port_name,
            baud = config.baud_rate,
            "opening serial port"
        );
        let port = serialport::new(&config.port_name, config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| LinkError::Open {
                port: config.port_name.clone(),
                source,
            })?;
        Ok(Box::new(port))
    }
}
