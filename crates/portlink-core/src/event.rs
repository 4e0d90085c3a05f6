//! Wire payloads and caller-facing link events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque message payload exchanged with the serial device.
///
/// The payload kind is chosen consistently with the framing mode in use:
/// line framing carries [`Payload::Text`], delimited framing carries
/// [`Payload::Binary`]. portlink never interprets the content.
///
/// # Examples
///
/// ```
/// use portlink_core::Payload;
///
/// let text = Payload::text("STATUS?");
/// assert_eq!(text.as_bytes(), b"STATUS?");
///
/// let binary = Payload::binary([0x01, 0x02, 0xFF]);
/// assert_eq!(binary.as_bytes(), &[0x01, 0x02, 0xFF]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// UTF-8 text, one message per line under line framing.
    Text(String),

    /// Raw bytes, one message per separator under delimited framing.
    Binary(Vec<u8>),
}

impl Payload {
    /// Create a text payload.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a binary payload.
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Binary(bytes.into())
    }

    /// View the payload as raw bytes, regardless of kind.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// View the payload as text, if it is a text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Number of payload bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the payload carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Binary(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02X} ")?;
                }
                Ok(())
            }
        }
    }
}

/// Event observed by the caller when polling the link.
///
/// Connection lifecycle changes and device data arrive through the same
/// inbound queue, in the order the worker observed them. The sentinels are
/// distinct variants: equality is structural and device data can never
/// alias them.
///
/// # Examples
///
/// ```
/// use portlink_core::{Event, Payload};
///
/// let event = Event::Data(Payload::text("Connected"));
/// // Device data that spells out "Connected" is still data.
/// assert_ne!(event, Event::Connected);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// The worker opened the device successfully.
    Connected,

    /// The device could not be opened, or an established connection failed.
    /// The worker retries after the configured reconnect delay.
    Disconnected,

    /// One complete message received from the device.
    Data(Payload),
}

impl Event {
    /// Whether this event carries device data.
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    /// Extract the payload, if this is a data event.
    pub fn into_payload(self) -> Option<Payload> {
        match self {
            Self::Data(payload) => Some(payload),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_text_bytes() {
        let payload = Payload::text("hello");
        assert_eq!(payload.as_bytes(), b"hello");
        assert_eq!(payload.as_text(), Some("hello"));
        assert_eq!(payload.len(), 5);
        assert!(!payload.is_empty());
    }

    #[test]
    fn test_payload_binary_has_no_text_view() {
        let payload = Payload::binary([0xDE, 0xAD]);
        assert_eq!(payload.as_text(), None);
        assert_eq!(payload.as_bytes(), &[0xDE, 0xAD]);
    }

    #[test]
    fn test_empty_payloads() {
        assert!(Payload::text("").is_empty());
        assert!(Payload::binary(Vec::new()).is_empty());
    }

    #[test]
    fn test_sentinels_are_not_data() {
        // Device data spelling out a sentinel's name is still data.
        assert_ne!(Event::Connected, Event::Data(Payload::text("Connected")));
        assert_ne!(
            Event::Disconnected,
            Event::Data(Payload::text("Disconnected"))
        );
        assert_ne!(Event::Connected, Event::Disconnected);
    }

    #[test]
    fn test_into_payload() {
        assert_eq!(
            Event::Data(Payload::text("x")).into_payload(),
            Some(Payload::text("x"))
        );
        assert_eq!(Event::Connected.into_payload(), None);
        assert_eq!(Event::Disconnected.into_payload(), None);
        assert!(!Event::Connected.is_data());
        assert!(Event::Data(Payload::binary([1])).is_data());
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(Payload::text("ok").to_string(), "ok");
        assert_eq!(Payload::binary([0x0A, 0xFF]).to_string(), "0A FF ");
    }
}
