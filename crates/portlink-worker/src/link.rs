//! Caller-facing link handle.
//!
//! [`LinkHandle::spawn`] starts the supervisor on a background thread and
//! returns a handle for exchanging messages with it. The handle never
//! blocks: [`poll`](LinkHandle::poll) returns immediately whether or not
//! an event is waiting, and [`send`](LinkHandle::send) only enqueues.
//!
//! # Examples
//!
//! ```no_run
//! use portlink_worker::{FramingMode, LinkConfig, LinkHandle};
//!
//! # fn main() -> portlink_worker::Result<()> {
//! let config = LinkConfig::new("/dev/ttyUSB0", 115_200);
//! let link = LinkHandle::spawn(config, FramingMode::Lines)?;
//!
//! link.send("PING");
//! while let Some(event) = link.poll() {
//!     println!("{event:?}");
//! }
//! link.shutdown();
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::queue::Shared;
use crate::supervisor::Supervisor;
use crate::transport::{DeviceOpener, SystemOpener};
use portlink_core::{Event, FramingMode, LinkConfig, Payload};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

type TeardownFn = Box<dyn FnOnce() + Send>;

/// Handle to a running serial link.
///
/// Dropping the handle shuts the link down the same way
/// [`shutdown`](LinkHandle::shutdown) does: the outbound queue is drained
/// to the device before the worker thread exits.
pub struct LinkHandle {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
    teardown: Option<TeardownFn>,
}

impl LinkHandle {
    /// Validate `config` and start the worker thread against a real port.
    ///
    /// Returns as soon as the thread is running; the first connection
    /// attempt happens on the worker. Watch for [`Event::Connected`] via
    /// [`poll`](LinkHandle::poll) to learn when the device is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the thread
    /// cannot be spawned. Failure to open the port is not an error here:
    /// the worker retries that forever.
    pub fn spawn(config: LinkConfig, mode: FramingMode) -> Result<Self> {
        Self::spawn_with_opener(config, mode, Box::new(SystemOpener::new()))
    }

    /// Start the worker thread with a custom device opener. This is the
    /// seam tests use to substitute a scripted transport.
    pub fn spawn_with_opener(
        config: LinkConfig,
        mode: FramingMode,
        opener: Box<dyn DeviceOpener>,
    ) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared::new(config.max_unread));
        let framing = portlink_framing::for_mode(mode);
        let supervisor = Supervisor::new(config, framing, opener, shared.clone());

        let thread = thread::Builder::new()
            .name("portlink-supervisor".to_string())
            .spawn(move || {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| supervisor.run())) {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    error!(%message, "link worker panicked");
                }
            })?;

        Ok(Self {
            shared,
            thread: Some(thread),
            teardown: None,
        })
    }

    /// Queue a payload for delivery to the device. Never blocks; if no
    /// device is currently open, the payload waits for the next connection.
    pub fn send(&self, payload: impl Into<Payload>) {
        self.shared.outbound.push(payload.into());
    }

    /// Take the oldest pending event, or `None` if nothing is waiting.
    pub fn poll(&self) -> Option<Event> {
        self.shared.inbound.pop()
    }

    /// A cloneable sender for queueing payloads from other threads, or
    /// from a teardown closure after the handle itself is consumed.
    pub fn sender(&self) -> MessageSender {
        MessageSender {
            shared: self.shared.clone(),
        }
    }

    /// Register a closure to run at the start of shutdown, before the stop
    /// signal reaches the worker. Messages it sends through a
    /// [`MessageSender`] are still drained to the device.
    ///
    /// A second call replaces the previous closure.
    pub fn set_teardown(&mut self, teardown: impl FnOnce() + Send + 'static) {
        self.teardown = Some(Box::new(teardown));
    }

    /// Stop the link: run the teardown closure if one is set, signal the
    /// worker, and block until it has drained the outbound queue and
    /// exited.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
        self.shared.request_stop();
        if let Some(thread) = self.thread.take() {
            debug!("waiting for link worker to stop");
            if thread.join().is_err() {
                error!("link worker thread terminated abnormally");
            }
        }
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

/// Cloneable handle for queueing outbound payloads.
///
/// Obtained from [`LinkHandle::sender`]. Sending after shutdown is
/// harmless: the payload is queued but never delivered.
#[derive(Clone)]
pub struct MessageSender {
    shared: Arc<Shared>,
}

impl MessageSender {
    /// Queue a payload for delivery to the device.
    pub fn send(&self, payload: impl Into<Payload>) {
        self.shared.outbound.push(payload.into());
    }
}
