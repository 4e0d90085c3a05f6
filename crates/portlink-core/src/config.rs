//! Link configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default read timeout for a single device read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Default write timeout for a single device write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Default wait before retrying a failed connection.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Default capacity of the inbound queue.
pub const DEFAULT_MAX_UNREAD: usize = 1;

/// Framing strategy selector, fixed for the lifetime of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FramingMode {
    /// Newline-delimited UTF-8 text. Outbound payloads are terminated with
    /// `\n`; inbound lines have their terminator (and a trailing `\r`)
    /// stripped.
    Lines,

    /// Binary messages split on a single separator byte. Outbound payloads
    /// are written verbatim; include the separator yourself if the device
    /// protocol requires it.
    Delimited {
        /// The separator byte scanned for in the inbound stream.
        separator: u8,
    },
}

/// Immutable configuration for a serial link.
///
/// Created once, validated at worker construction, never mutated afterwards.
///
/// # Examples
///
/// ```
/// use portlink_core::LinkConfig;
/// use std::time::Duration;
///
/// let config = LinkConfig::new("/dev/ttyUSB0", 115_200)
///     .with_reconnect_delay(Duration::from_millis(500))
///     .with_max_unread(16);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Device address, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port_name: String,

    /// Baud rate the device transmits at.
    pub baud_rate: u32,

    /// Upper bound for a single device read. Expired reads are empty
    /// cycles, not errors.
    pub read_timeout: Duration,

    /// Upper bound for a single device write.
    pub write_timeout: Duration,

    /// How long to wait after a connection failure before retrying.
    ///
    /// The worker sleeps this entire delay before re-checking the stop
    /// flag; a shutdown requested mid-backoff is honored once the delay
    /// elapses.
    pub reconnect_delay: Duration,

    /// Capacity of the inbound queue. Once full, newly received messages
    /// are discarded until the caller drains the queue. Minimum 1.
    ///
    /// The [`Connected`](crate::Event::Connected) and
    /// [`Disconnected`](crate::Event::Disconnected) sentinels share this
    /// bound with device data: at the default capacity of 1, a caller that
    /// stops polling can miss a lifecycle change. Size the queue for the
    /// longest stretch between polls.
    pub max_unread: usize,
}

impl LinkConfig {
    /// Create a configuration for the given port with default tuning
    /// (100 ms read/write timeouts, 1 s reconnect delay, one unread slot).
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_unread: DEFAULT_MAX_UNREAD,
        }
    }

    /// Set the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the inbound queue capacity.
    pub fn with_max_unread(mut self, max_unread: usize) -> Self {
        self.max_unread = max_unread;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the port name is empty, the baud
    /// rate is zero, or `max_unread` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.port_name.is_empty() {
            return Err(Error::invalid_config("port name must not be empty"));
        }
        if self.baud_rate == 0 {
            return Err(Error::invalid_config("baud rate must be non-zero"));
        }
        if self.max_unread == 0 {
            return Err(Error::invalid_config("max_unread must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_applies_defaults() {
        let config = LinkConfig::new("COM3", 9600);
        assert_eq!(config.port_name, "COM3");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.read_timeout, DEFAULT_READ_TIMEOUT);
        assert_eq!(config.write_timeout, DEFAULT_WRITE_TIMEOUT);
        assert_eq!(config.reconnect_delay, DEFAULT_RECONNECT_DELAY);
        assert_eq!(config.max_unread, DEFAULT_MAX_UNREAD);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = LinkConfig::new("/dev/ttyACM0", 115_200)
            .with_read_timeout(Duration::from_millis(20))
            .with_write_timeout(Duration::from_millis(30))
            .with_reconnect_delay(Duration::from_millis(40))
            .with_max_unread(8);

        assert_eq!(config.read_timeout, Duration::from_millis(20));
        assert_eq!(config.write_timeout, Duration::from_millis(30));
        assert_eq!(config.reconnect_delay, Duration::from_millis(40));
        assert_eq!(config.max_unread, 8);
    }

    #[rstest]
    #[case::empty_port("", 9600, 1)]
    #[case::zero_baud("COM1", 0, 1)]
    #[case::zero_capacity("COM1", 9600, 0)]
    fn test_validate_rejects(#[case] port: &str, #[case] baud: u32, #[case] max_unread: usize) {
        let config = LinkConfig::new(port, baud).with_max_unread(max_unread);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrips_through_serde() {
        let config = LinkConfig::new("/dev/ttyUSB1", 57_600).with_max_unread(4);
        let json = serde_json::to_string(&config).unwrap();
        let back: LinkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_framing_mode_variants() {
        assert_ne!(FramingMode::Lines, FramingMode::Delimited { separator: b'\n' });
        let mode = FramingMode::Delimited { separator: 0x00 };
        if let FramingMode::Delimited { separator } = mode {
            assert_eq!(separator, 0x00);
        }
    }
}
