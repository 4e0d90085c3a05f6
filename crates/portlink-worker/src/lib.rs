//! Reconnecting serial link worker.
//!
//! This crate runs a serial connection on a dedicated background thread
//! and exposes it to the caller as a pair of message queues. The worker
//! survives unplugged cables and failed opens: it retries forever,
//! announcing every transition with [`Event::Connected`] and
//! [`Event::Disconnected`] sentinels interleaved in order with the data.
//!
//! # Architecture
//!
//! ```text
//!   caller thread                        worker thread
//!  ┌────────────┐  outbound (unbounded) ┌────────────┐       ┌────────┐
//!  │ LinkHandle │──────────────────────►│ Supervisor │◄─────►│ device │
//!  │            │◄──────────────────────│            │       └────────┘
//!  └────────────┘  inbound (bounded,    └────────────┘
//!                   drop-newest)
//! ```
//!
//! The caller never touches the device and never blocks: `send` enqueues,
//! `poll` dequeues, and `shutdown` waits only for the final drain.
//!
//! # Examples
//!
//! ```no_run
//! use portlink_worker::{Event, FramingMode, LinkConfig, LinkHandle};
//!
//! # fn main() -> portlink_worker::Result<()> {
//! let config = LinkConfig::new("/dev/ttyUSB0", 115_200);
//! let link = LinkHandle::spawn(config, FramingMode::Lines)?;
//!
//! loop {
//!     match link.poll() {
//!         Some(Event::Connected) => link.send("HELLO"),
//!         Some(Event::Data(payload)) => println!("device says: {payload}"),
//!         Some(Event::Disconnected) => println!("device lost, reconnecting"),
//!         None => std::thread::sleep(std::time::Duration::from_millis(10)),
//!     }
//! }
//! # }
//! ```

pub mod error;
pub mod link;
pub mod mock;
pub(crate) mod queue;
pub(crate) mod supervisor;
pub mod transport;

pub use error::{LinkError, Result};
pub use link::{LinkHandle, MessageSender};
pub use transport::{Device, DeviceOpener, SerialDevice, SystemOpener};

pub use portlink_core::{Event, FramingMode, LinkConfig, Payload};
