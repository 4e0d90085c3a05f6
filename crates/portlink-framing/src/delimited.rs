//! Separator-byte binary framing.

use crate::{Framing, fill_from};
use bytes::{Buf, BytesMut};
use portlink_core::Payload;
use std::io::{self, Read, Write};
use tracing::warn;

/// Accumulation buffer size; a single message must fit.
const BUFFER_CAPACITY: usize = 1024;

/// Binary framing that splits the inbound stream on a single separator byte.
///
/// Outbound payloads are written verbatim — the separator is part of the
/// device protocol, so include it in the payload if the device expects one.
/// Inbound bytes accumulate in a fixed 1024-byte buffer; each complete
/// message is the bytes before the next separator, and the separator itself
/// is consumed.
///
/// If the buffer fills without a separator appearing, the stream is not
/// framed the way this strategy was configured for; the buffered bytes are
/// discarded with a warning and scanning resumes, resynchronizing at the
/// next separator.
///
/// # Examples
///
/// ```
/// use portlink_core::Payload;
/// use portlink_framing::{DelimitedFraming, Framing};
///
/// let mut framing = DelimitedFraming::new(0x0A);
/// let mut inbound: &[u8] = &[0x01, 0x02, 0x0A, 0x03];
/// let message = framing.read_frame(&mut inbound).unwrap();
/// assert_eq!(message, Some(Payload::binary([0x01, 0x02])));
/// ```
#[derive(Debug)]
pub struct DelimitedFraming {
    separator: u8,
    buffer: BytesMut,
}

impl DelimitedFraming {
    /// Create a delimited framing strategy for the given separator byte.
    pub fn new(separator: u8) -> Self {
        Self {
            separator,
            buffer: BytesMut::with_capacity(BUFFER_CAPACITY),
        }
    }

    /// The configured separator byte.
    pub fn separator(&self) -> u8 {
        self.separator
    }

    /// Extract one complete message from the buffer, if present.
    fn extract_frame(&mut self) -> Option<Payload> {
        let index = self.buffer.iter().position(|&b| b == self.separator)?;
        let frame = self.buffer.split_to(index);
        self.buffer.advance(1);
        Some(Payload::Binary(frame.to_vec()))
    }
}

impl Framing for DelimitedFraming {
    fn write_frame(&mut self, payload: &Payload, wire: &mut dyn Write) -> io::Result<()> {
        wire.write_all(payload.as_bytes())?;
        wire.flush()
    }

    fn read_frame(&mut self, wire: &mut dyn Read) -> io::Result<Option<Payload>> {
        if let Some(frame) = self.extract_frame() {
            return Ok(Some(frame));
        }

        let free = BUFFER_CAPACITY - self.buffer.len();
        if free > 0 {
            let mut chunk = [0u8; BUFFER_CAPACITY];
            let n = fill_from(wire, &mut chunk[..free])?;
            self.buffer.extend_from_slice(&chunk[..n]);
        }

        match self.extract_frame() {
            Some(frame) => Ok(Some(frame)),
            None if self.buffer.len() == BUFFER_CAPACITY => {
                warn!(
                    separator = self.separator,
                    "no separator within {BUFFER_CAPACITY} bytes, discarding buffer"
                );
                self.buffer.clear();
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ScriptedWire, Step};
    use proptest::prelude::*;
    use rstest::rstest;

    const SEP: u8 = b',';

    #[test]
    fn test_write_is_verbatim() {
        let mut framing = DelimitedFraming::new(SEP);
        let mut wire = Vec::new();
        framing
            .write_frame(&Payload::binary([1, 2, SEP]), &mut wire)
            .unwrap();
        assert_eq!(wire, vec![1, 2, SEP]);
    }

    #[test]
    fn test_split_preserves_remainder() {
        // Buffered `A | sep | B`: one call yields A, the next yields B once
        // its own separator arrives, with no loss or duplication.
        let mut framing = DelimitedFraming::new(SEP);
        let mut wire = ScriptedWire::new([
            Step::Chunk(b"AAA,BB".to_vec()),
            Step::Timeout,
            Step::Chunk(b",".to_vec()),
        ]);

        assert_eq!(
            framing.read_frame(&mut wire).unwrap(),
            Some(Payload::binary(*b"AAA"))
        );
        assert_eq!(framing.read_frame(&mut wire).unwrap(), None);
        assert_eq!(
            framing.read_frame(&mut wire).unwrap(),
            Some(Payload::binary(*b"BB"))
        );
    }

    #[test]
    fn test_buffered_frames_need_no_further_reads() {
        let mut framing = DelimitedFraming::new(SEP);
        let mut wire = ScriptedWire::chunks([b"a,b,c,"]);

        // All three frames arrive in one read; the later calls are served
        // from the buffer even though the wire has hit end-of-stream.
        assert_eq!(
            framing.read_frame(&mut wire).unwrap(),
            Some(Payload::binary(*b"a"))
        );
        assert_eq!(
            framing.read_frame(&mut wire).unwrap(),
            Some(Payload::binary(*b"b"))
        );
        assert_eq!(
            framing.read_frame(&mut wire).unwrap(),
            Some(Payload::binary(*b"c"))
        );
    }

    #[rstest]
    #[case::zero_separator(0x00)]
    #[case::newline(0x0A)]
    #[case::high_bit(0xFF)]
    fn test_any_separator_byte(#[case] separator: u8) {
        let mut framing = DelimitedFraming::new(separator);
        assert_eq!(framing.separator(), separator);

        let payload = vec![separator.wrapping_add(1), separator.wrapping_add(2)];
        let mut message = payload.clone();
        message.push(separator);

        let mut wire = ScriptedWire::new([Step::Chunk(message)]);
        assert_eq!(
            framing.read_frame(&mut wire).unwrap(),
            Some(Payload::Binary(payload))
        );
    }

    #[test]
    fn test_no_separator_keeps_buffering() {
        let mut framing = DelimitedFraming::new(SEP);
        let mut wire = ScriptedWire::new([
            Step::Chunk(b"abc".to_vec()),
            Step::Timeout,
            Step::Chunk(b"def,".to_vec()),
        ]);

        assert_eq!(framing.read_frame(&mut wire).unwrap(), None);
        assert_eq!(framing.read_frame(&mut wire).unwrap(), None);
        assert_eq!(
            framing.read_frame(&mut wire).unwrap(),
            Some(Payload::binary(*b"abcdef"))
        );
    }

    #[test]
    fn test_overflow_discards_and_resynchronizes() {
        let mut framing = DelimitedFraming::new(SEP);
        let mut wire = ScriptedWire::new([
            Step::Chunk(vec![b'x'; BUFFER_CAPACITY]),
            Step::Chunk(b"ok,".to_vec()),
        ]);

        // Buffer fills with no separator in sight: contents are dropped.
        assert_eq!(framing.read_frame(&mut wire).unwrap(), None);
        // The stream resynchronizes at the next separator.
        assert_eq!(
            framing.read_frame(&mut wire).unwrap(),
            Some(Payload::binary(*b"ok"))
        );
    }

    #[test]
    fn test_eof_is_an_error() {
        let mut framing = DelimitedFraming::new(SEP);
        let mut wire = ScriptedWire::new([]);
        let err = framing.read_frame(&mut wire).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    proptest! {
        #[test]
        fn prop_split_at_first_separator(
            head in proptest::collection::vec(1u8..=255, 0..200),
            tail in proptest::collection::vec(any::<u8>(), 0..200),
        ) {
            // `head` contains no zero byte, so with separator 0 the first
            // frame is exactly `head` and `tail` stays buffered.
            let mut framing = DelimitedFraming::new(0x00);
            let mut message = head.clone();
            message.push(0x00);
            message.extend_from_slice(&tail);

            let mut wire = ScriptedWire::new([Step::Chunk(message)]);
            let frame = framing.read_frame(&mut wire).unwrap();
            prop_assert_eq!(frame, Some(Payload::Binary(head)));
            prop_assert_eq!(framing.buffer.as_ref(), tail.as_slice());
        }
    }
}
