//! Scripted mock transport for testing without physical hardware.
//!
//! A [`MockOpener`] serves one scripted [`MockConnection`] per connection
//! attempt and falls back to an idle connection (all reads time out) once
//! the script is exhausted. The paired [`MockHandle`] observes everything
//! the worker did: how many times it opened the device and every byte it
//! wrote, in order.
//!
//! # Examples
//!
//! ```
//! use portlink_worker::mock::{MockConnection, MockOpener, ReadStep};
//!
//! let (opener, handle) = MockOpener::new([
//!     MockConnection::with_reads([ReadStep::Data(b"hello\n".to_vec()), ReadStep::Drop]),
//!     MockConnection::idle(),
//! ]);
//! assert_eq!(handle.open_count(), 0);
//! # let _ = opener;
//! ```

use crate::error::{LinkError, Result};
use crate::transport::{Device, DeviceOpener};
use portlink_core::LinkConfig;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// How long a scripted timeout blocks before reporting `TimedOut`. Keeps
/// test workers from spinning hot while staying fast.
const TIMEOUT_STEP: Duration = Duration::from_millis(2);

/// One step of a scripted read sequence.
#[derive(Debug, Clone)]
pub enum ReadStep {
    /// Serve these bytes (split across reads if the buffer is smaller).
    Data(Vec<u8>),

    /// Block briefly, then report a read timeout.
    Timeout,

    /// Report a hard I/O error, as a yanked cable would.
    Drop,
}

/// Script for a single connection attempt.
#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    fail_open: bool,
    reads: Vec<ReadStep>,
}

impl MockConnection {
    /// A connection that opens successfully and then only times out.
    pub fn idle() -> Self {
        Self::default()
    }

    /// A connection attempt that fails to open.
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            reads: Vec::new(),
        }
    }

    /// A connection serving the given read steps, then timing out forever.
    pub fn with_reads(reads: impl IntoIterator<Item = ReadStep>) -> Self {
        Self {
            fail_open: false,
            reads: reads.into_iter().collect(),
        }
    }
}

struct MockState {
    connections: Mutex<VecDeque<MockConnection>>,
    written: Mutex<Vec<u8>>,
    opens: AtomicUsize,
}

/// Device opener serving scripted connections.
pub struct MockOpener {
    state: Arc<MockState>,
}

impl MockOpener {
    /// Create an opener with a connection script and its observer handle.
    pub fn new(connections: impl IntoIterator<Item = MockConnection>) -> (Self, MockHandle) {
        let state = Arc::new(MockState {
            connections: Mutex::new(connections.into_iter().collect()),
            written: Mutex::new(Vec::new()),
            opens: AtomicUsize::new(0),
        });
        let handle = MockHandle {
            state: state.clone(),
        };
        (Self { state }, handle)
    }
}

impl DeviceOpener for MockOpener {
    fn open(&mut self, config: &LinkConfig) -> Result<Device> {
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        let connection = self
            .state
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_default();

        if connection.fail_open {
            return Err(LinkError::Open {
                port: config.port_name.clone(),
                source: serialport::Error::new(
                    serialport::ErrorKind::NoDevice,
                    "scripted open failure",
                ),
            });
        }

        Ok(Box::new(MockDevice {
            reads: connection.reads.into(),
            state: self.state.clone(),
        }))
    }
}

/// Observer for everything the worker did to the mock transport.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<MockState>,
}

impl MockHandle {
    /// How many connection attempts have been made.
    pub fn open_count(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    /// Every byte written to any mock device, in write order.
    pub fn written(&self) -> Vec<u8> {
        self.state
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

struct MockDevice {
    reads: VecDeque<ReadStep>,
    state: Arc<MockState>,
}

impl Read for MockDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            Some(ReadStep::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    bytes.drain(..n);
                    self.reads.push_front(ReadStep::Data(bytes));
                }
                Ok(n)
            }
            Some(ReadStep::Drop) => Err(io::ErrorKind::BrokenPipe.into()),
            Some(ReadStep::Timeout) | None => {
                std::thread::sleep(TIMEOUT_STEP);
                Err(io::ErrorKind::TimedOut.into())
            }
        }
    }
}

impl Write for MockDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state
            .written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
