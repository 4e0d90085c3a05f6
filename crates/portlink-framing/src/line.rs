//! Newline-delimited text framing.

use crate::{Framing, fill_from};
use bytes::{Buf, BytesMut};
use portlink_core::Payload;
use std::io::{self, Read, Write};
use tracing::warn;

/// How many bytes we pull from the device per read attempt.
const READ_CHUNK: usize = 256;

/// Longest line we will accumulate before assuming the stream is not
/// actually line-oriented and resynchronizing.
const MAX_LINE_LEN: usize = 4096;

/// Newline-delimited text framing.
///
/// Outbound payloads are written followed by `\n`. Inbound bytes are
/// accumulated until a `\n` arrives; the returned line has the terminator
/// removed and a trailing `\r` stripped, so CRLF devices work unchanged.
/// Bytes are decoded as UTF-8, with invalid sequences replaced.
///
/// # Examples
///
/// ```
/// use portlink_core::Payload;
/// use portlink_framing::{Framing, LineFraming};
///
/// let mut framing = LineFraming::new();
/// let mut inbound: &[u8] = b"hello\r\nnext";
/// let message = framing.read_frame(&mut inbound).unwrap();
/// assert_eq!(message, Some(Payload::text("hello")));
/// ```
#[derive(Debug, Default)]
pub struct LineFraming {
    buffer: BytesMut,
}

impl LineFraming {
    /// Create a line framing strategy with an empty accumulation buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    /// Extract one complete line from the buffer, if present.
    fn extract_line(&mut self) -> Option<Payload> {
        let index = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line = self.buffer.split_to(index);
        self.buffer.advance(1);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Some(Payload::Text(String::from_utf8_lossy(&line).into_owned()))
    }
}

impl Framing for LineFraming {
    fn write_frame(&mut self, payload: &Payload, wire: &mut dyn Write) -> io::Result<()> {
        wire.write_all(payload.as_bytes())?;
        wire.write_all(b"\n")?;
        wire.flush()
    }

    fn read_frame(&mut self, wire: &mut dyn Read) -> io::Result<Option<Payload>> {
        if let Some(line) = self.extract_line() {
            return Ok(Some(line));
        }

        let mut chunk = [0u8; READ_CHUNK];
        let n = fill_from(wire, &mut chunk)?;
        self.buffer.extend_from_slice(&chunk[..n]);

        match self.extract_line() {
            Some(line) => Ok(Some(line)),
            None if self.buffer.len() > MAX_LINE_LEN => {
                warn!(
                    buffered = self.buffer.len(),
                    "no line terminator within {MAX_LINE_LEN} bytes, discarding buffer"
                );
                self.buffer.clear();
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
