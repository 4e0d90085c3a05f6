//! Core types for the portlink serial bridge.
//!
//! This crate defines the vocabulary shared by every portlink crate: the
//! wire [`Payload`], the caller-facing [`Event`] stream, the immutable
//! [`LinkConfig`] a worker is constructed from, and the common error type.
//!
//! # Events vs. payloads
//!
//! Everything a device emits reaches the caller as [`Event::Data`]. The two
//! connection sentinels, [`Event::Connected`] and [`Event::Disconnected`],
//! are enum variants rather than reserved payload values, so a device that
//! happens to transmit the text `"Connected"` can never be mistaken for a
//! lifecycle event.

pub mod config;
pub mod error;
pub mod event;

pub use config::{FramingMode, LinkConfig};
pub use error::{Error, Result};
pub use event::{Event, Payload};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
