use std::io::{self, Read};

use bytes::{Bytes, BytesMut};

use crate::error::{CodecError, Result};
use crate::frame::{Frame, FrameConfig, FrameKind, Prelude, PRELUDE_LEN};

/// Blocking frame reader. Wrap the stream in a `BufReader` to avoid two
/// syscalls per frame.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete frame.
    ///
    /// End of stream, at a frame boundary or inside one, is
    /// [`CodecError::ConnectionClosed`].
    pub fn read_frame(&mut self) -> Result<Frame> {
        let mut raw = [0u8; PRELUDE_LEN];
        fill(&mut self.inner, &mut raw)?;
        let prelude = Prelude::parse(&raw, self.config.max_payload_size)?;

        let mut payload = BytesMut::zeroed(prelude.len);
        fill(&mut self.inner, &mut payload)?;
        Ok(Frame {
            kind: prelude.kind,
            payload: payload.freeze(),
        })
    }

    /// Read the next frame's payload, requiring it to be of `kind`.
    pub fn read_kind(&mut self, kind: FrameKind) -> Result<Bytes> {
        let frame = self.read_frame()?;
        if frame.kind != kind {
            return Err(CodecError::UnexpectedFrame {
                expected: kind.code(),
                got: frame.kind.code(),
            });
        }
        Ok(frame.payload)
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

fn fill(reader: &mut impl Read, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => CodecError::ConnectionClosed,
        _ => CodecError::Io(err),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::frame::{encode_frame, DEFAULT_MAX_PAYLOAD};

    fn wire(frames: &[(FrameKind, &[u8])]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (kind, payload) in frames {
            encode_frame(*kind, payload, DEFAULT_MAX_PAYLOAD, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    /// Hands out one byte per read call.
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let end = buf.len().min(1);
            self.0.read(&mut buf[..end])
        }
    }

    #[test]
    fn header_then_body() {
        let bytes = wire(&[(FrameKind::Header, b"head"), (FrameKind::Body, b"")]);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        assert_eq!(reader.read_kind(FrameKind::Header).unwrap().as_ref(), b"head");
        assert!(reader.read_kind(FrameKind::Body).unwrap().is_empty());
        assert!(reader.read_frame().unwrap_err().is_closed());
    }

    #[test]
    fn survives_one_byte_reads() {
        let payload = vec![7u8; 3000];
        let bytes = wire(&[(FrameKind::Body, &payload)]);
        let mut reader = FrameReader::new(Trickle(Cursor::new(bytes)));

        assert_eq!(reader.read_kind(FrameKind::Body).unwrap().as_ref(), payload.as_slice());
    }

    #[test]
    fn truncated_payload_is_closed() {
        let mut bytes = wire(&[(FrameKind::Body, b"cut short")]);
        bytes.truncate(PRELUDE_LEN + 3);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        assert!(matches!(
            reader.read_frame().unwrap_err(),
            CodecError::ConnectionClosed
        ));
    }

    #[test]
    fn body_where_header_expected() {
        let bytes = wire(&[(FrameKind::Body, b"early")]);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        assert!(matches!(
            reader.read_kind(FrameKind::Header).unwrap_err(),
            CodecError::UnexpectedFrame {
                expected: 1,
                got: 2
            }
        ));
    }

    #[test]
    fn limit_applies_to_incoming_frames() {
        let bytes = wire(&[(FrameKind::Body, &[0u8; 64])]);
        let config = FrameConfig {
            max_payload_size: 16,
        };
        let mut reader = FrameReader::with_config(Cursor::new(bytes), config);

        assert!(matches!(
            reader.read_frame().unwrap_err(),
            CodecError::PayloadTooLarge { size: 64, max: 16 }
        ));
    }
}
