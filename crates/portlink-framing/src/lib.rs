//! Framing strategies for the portlink serial bridge.
//!
//! A serial connection is a continuous byte stream; framing is the rule that
//! splits it into discrete messages. This crate provides the [`Framing`]
//! trait the worker drives once per streaming cycle, with two
//! implementations:
//!
//! - [`LineFraming`] — newline-delimited UTF-8 text. The workhorse for
//!   microcontroller firmware that `println!`s its telemetry.
//! - [`DelimitedFraming`] — binary messages split on a caller-chosen
//!   separator byte.
//!
//! # Reading model
//!
//! `read_frame` never blocks longer than the device's configured read
//! timeout: it performs at most one device read per call, accumulates
//! partial data internally, and returns `Ok(None)` when no complete message
//! is available yet. A read timeout is an empty cycle, not an error; only
//! real I/O failures (including end-of-stream) surface as `Err`, which the
//! worker treats as a disconnect.
//!
//! # Examples
//!
//! ```
//! use portlink_core::Payload;
//! use portlink_framing::{Framing, LineFraming};
//!
//! let mut framing = LineFraming::new();
//! let mut wire = Vec::new();
//! framing.write_frame(&Payload::text("ping"), &mut wire).unwrap();
//! assert_eq!(wire, b"ping\n");
//! ```

mod delimited;
mod line;

pub use delimited::DelimitedFraming;
pub use line::LineFraming;

use portlink_core::{FramingMode, Payload};
use std::io::{self, Read, Write};

/// A framing strategy: encodes one outbound payload per send and scans the
/// inbound stream into zero-or-one complete message per read.
pub trait Framing: Send {
    /// Encode `payload` and write it to the device.
    fn write_frame(&mut self, payload: &Payload, wire: &mut dyn Write) -> io::Result<()>;

    /// Attempt to produce one complete inbound message.
    ///
    /// Performs at most one device read (bounded by the device's read
    /// timeout). Returns `Ok(None)` when no complete message is available
    /// yet; buffered partial data is preserved for the next call. A message
    /// already sitting complete in the internal buffer is returned without
    /// touching the device.
    fn read_frame(&mut self, wire: &mut dyn Read) -> io::Result<Option<Payload>>;
}

/// Construct the framing strategy for a [`FramingMode`].
pub fn for_mode(mode: FramingMode) -> Box<dyn Framing> {
    match mode {
        FramingMode::Lines => Box::new(LineFraming::new()),
        FramingMode::Delimited { separator } => Box::new(DelimitedFraming::new(separator)),
    }
}

/// Read into `buf`, treating a timeout as zero bytes and end-of-stream as a
/// hard error. Serial reads with a timeout configured report expiry as
/// `TimedOut` (or `WouldBlock` on some platforms); neither means the device
/// went away.
pub(crate) fn fill_from(wire: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    debug_assert!(!buf.is_empty());
    match wire.read(buf) {
        Ok(0) => Err(io::ErrorKind::UnexpectedEof.into()),
        Ok(n) => Ok(n),
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ) =>
        {
            Ok(0)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::collections::VecDeque;
    use std::io::{self, Read};

    /// Scripted reader: serves chunks and timeouts in order, then reports
    /// end-of-stream.
    pub struct ScriptedWire {
        steps: VecDeque<Step>,
    }

    pub enum Step {
        Chunk(Vec<u8>),
        Timeout,
    }

    impl ScriptedWire {
        pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                steps: steps.into_iter().collect(),
            }
        }

        pub fn chunks<const N: usize>(chunks: [&[u8]; N]) -> Self {
            Self::new(chunks.map(|c| Step::Chunk(c.to_vec())))
        }
    }

    impl Read for ScriptedWire {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.steps.pop_front() {
                Some(Step::Chunk(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        chunk.drain(..n);
                        self.steps.push_front(Step::Chunk(chunk));
                    }
                    Ok(n)
                }
                Some(Step::Timeout) => Err(io::ErrorKind::TimedOut.into()),
                None => Ok(0),
            }
        }
    }
}
