//! Connection supervisor: the state machine run by the worker thread.
//!
//! The supervisor owns the device handle for the lifetime of the link. It
//! cycles through connect → stream → reconnect until a stop is requested,
//! then drains the outbound queue and closes the device:
//!
//! ```text
//! ┌────────────┐ open ok  ┌───────────┐
//! │ Connecting │─────────►│ Streaming │◄─┐ one send + one read
//! └────────────┘          └───────────┘──┘ per cycle
//!       ▲  │ open failed        │ I/O error
//!       │  ▼                    ▼
//!       │ ┌───────────────────────┐        ┌──────────┐     ┌─────────┐
//!       └─│     ReconnectWait     │  stop: │ Draining │────►│ Stopped │
//!         └───────────────────────┘        └──────────┘     └─────────┘
//! ```
//!
//! Every entry into `Connecting` or a streaming cycle re-checks the stop
//! flag. The reconnect sleep does not: a stop requested mid-backoff takes
//! effect once the delay elapses.

use crate::queue::Shared;
use crate::transport::{Device, DeviceOpener};
use portlink_core::{Event, LinkConfig};
use portlink_framing::Framing;
use std::io;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, trace, warn};

/// Connection lifecycle state. Owned exclusively by the supervisor thread;
/// the caller observes transitions only through sentinel events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    /// Attempting to open the device.
    Connecting,

    /// Connected; moving messages between the device and the queues.
    Streaming,

    /// Waiting out the backoff delay after a connection failure.
    ReconnectWait,

    /// Stop observed: flushing the outbound queue, then closing.
    Draining,

    /// Terminal; the worker thread exits.
    Stopped,
}

/// The background worker. Constructed by the link handle, consumed by
/// [`run`](Supervisor::run) on a dedicated thread.
pub(crate) struct Supervisor {
    config: LinkConfig,
    framing: Box<dyn Framing>,
    opener: Box<dyn DeviceOpener>,
    shared: Arc<Shared>,
}

impl Supervisor {
    pub(crate) fn new(
        config: LinkConfig,
        framing: Box<dyn Framing>,
        opener: Box<dyn DeviceOpener>,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            config,
            framing,
            opener,
            shared,
        }
    }

    /// Run the state machine to completion. Returns once `Stopped` is
    /// reached; the final drain has then already happened.
    pub(crate) fn run(mut self) {
        let mut device: Option<Device> = None;
        let mut state = LinkState::Connecting;

        loop {
            state = match state {
                LinkState::Connecting if self.shared.stop_requested() => LinkState::Draining,
                LinkState::Connecting => self.connect(&mut device),
                LinkState::Streaming if self.shared.stop_requested() => LinkState::Draining,
                LinkState::Streaming => self.stream_once(&mut device),
                LinkState::ReconnectWait => {
                    trace!(delay = ?self.config.reconnect_delay, "waiting before reconnect");
                    thread::sleep(self.config.reconnect_delay);
                    LinkState::Connecting
                }
                LinkState::Draining => {
                    self.drain(&mut device);
                    LinkState::Stopped
                }
                LinkState::Stopped => break,
            };
        }

        debug!(port = %self.config.port_name, "supervisor stopped");
    }

    /// Open the device and announce the connection.
    fn connect(&mut self, device: &mut Option<Device>) -> LinkState {
        match self.opener.open(&self.config) {
            Ok(opened) => {
                info!(port = %self.config.port_name, "serial device connected");
                *device = Some(opened);
                self.push_event(Event::Connected);
                LinkState::Streaming
            }
            Err(error) => {
                warn!(port = %self.config.port_name, %error, "connection failed");
                self.disconnect(device)
            }
        }
    }

    /// One streaming cycle: send at most one outbound payload, then attempt
    /// one framed read. The send goes first so a payload queued just before
    /// a burst of device data is not starved.
    fn stream_once(&mut self, device: &mut Option<Device>) -> LinkState {
        let step = match device.as_mut() {
            Some(dev) => self.step(dev),
            None => return LinkState::Connecting,
        };

        match step {
            Ok(()) => LinkState::Streaming,
            Err(error) => {
                warn!(port = %self.config.port_name, %error, "device I/O failed");
                self.disconnect(device)
            }
        }
    }

    fn step(&mut self, device: &mut Device) -> io::Result<()> {
        if let Some(payload) = self.shared.outbound.pop() {
            trace!(bytes = payload.len(), "writing payload");
            self.framing.write_frame(&payload, &mut **device)?;
        }

        // A timeout surfaces here as Ok(None): an empty cycle, not an error.
        if let Some(payload) = self.framing.read_frame(&mut **device)? {
            if !self.shared.inbound.push(Event::Data(payload)) {
                trace!("inbound queue full, message dropped");
            }
        }
        Ok(())
    }

    /// Announce the loss and release the handle. Closing is dropping: any
    /// failure inside the device's teardown stays on this thread.
    fn disconnect(&mut self, device: &mut Option<Device>) -> LinkState {
        self.push_event(Event::Disconnected);
        if device.take().is_some() {
            debug!(port = %self.config.port_name, "serial device closed");
        }
        LinkState::ReconnectWait
    }

    /// Flush every pending outbound payload, then close unconditionally.
    /// This is the delivery guarantee behind teardown messages: anything
    /// queued before the stop signal still reaches the wire.
    fn drain(&mut self, device: &mut Option<Device>) {
        match device.as_mut() {
            Some(dev) => {
                let mut delivered = 0usize;
                while let Some(payload) = self.shared.outbound.pop() {
                    if let Err(error) = self.framing.write_frame(&payload, &mut **dev) {
                        warn!(
                            %error,
                            remaining = self.shared.outbound.len(),
                            "drain write failed, discarding remaining payloads"
                        );
                        break;
                    }
                    delivered += 1;
                }
                if delivered > 0 {
                    debug!(delivered, "outbound queue drained");
                }
            }
            None => {
                let discarded = self.shared.outbound.clear();
                if discarded > 0 {
                    warn!(discarded, "stopping with no open device, payloads discarded");
                }
            }
        }

        device.take();
        info!(port = %self.config.port_name, "link closed");
    }

    fn push_event(&self, event: Event) {
        if !self.shared.inbound.push(event) {
            debug!("inbound queue full, event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockConnection, MockOpener};
    use portlink_core::{FramingMode, Payload};

    fn config() -> LinkConfig {
        LinkConfig::new("mock0", 9600)
            .with_reconnect_delay(std::time::Duration::from_millis(5))
            .with_max_unread(16)
    }

    #[test]
    fn test_stop_before_first_connect_discards_outbound() {
        let (opener, handle) = MockOpener::new([MockConnection::idle()]);
        let shared = Arc::new(Shared::new(16));
        shared.outbound.push(Payload::text("never sent"));
        shared.request_stop();

        let supervisor = Supervisor::new(
            config(),
            portlink_framing::for_mode(FramingMode::Lines),
            Box::new(opener),
            shared.clone(),
        );
        supervisor.run();

        // No device was ever opened, so nothing reached a wire.
        assert_eq!(handle.open_count(), 0);
        assert!(handle.written().is_empty());
        assert_eq!(shared.outbound.pop(), None);
        assert_eq!(shared.inbound.pop(), None);
    }

    #[test]
    fn test_failed_open_announces_disconnect_then_retries() {
        let (opener, handle) = MockOpener::new([MockConnection::failing()]);
        let shared = Arc::new(Shared::new(16));

        let supervisor = Supervisor::new(
            config(),
            portlink_framing::for_mode(FramingMode::Lines),
            Box::new(opener),
            shared.clone(),
        );

        let shared_for_caller = shared.clone();
        let worker = std::thread::spawn(move || supervisor.run());

        // First attempt fails and is announced; the second (default idle
        // connection) succeeds.
        let mut events = Vec::new();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        while events.len() < 2 && std::time::Instant::now() < deadline {
            if let Some(event) = shared_for_caller.inbound.pop() {
                events.push(event);
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }

        assert_eq!(events, vec![Event::Disconnected, Event::Connected]);
        assert_eq!(handle.open_count(), 2);

        shared_for_caller.request_stop();
        worker.join().unwrap();
    }
}
