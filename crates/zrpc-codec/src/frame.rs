//! Length-prefixed frames used by the binary codec.
//!
//! Every header and every body travels in its own frame:
//!
//! ```text
//! +-----------+-------------+-----------+------------------+
//! | "ZR" (2B) | length (4B) | kind (2B) | payload (length) |
//! |           | LE          | LE        |                  |
//! +-----------+-------------+-----------+------------------+
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};

/// Magic + length + kind.
pub const PRELUDE_LEN: usize = 8;

pub const MAGIC: [u8; 2] = *b"ZR";

/// Default ceiling for one header or body: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// What a frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FrameKind {
    /// An encoded [`Header`](crate::Header).
    Header = 1,
    /// An encoded message body.
    Body = 2,
}

impl FrameKind {
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for FrameKind {
    type Error = u16;

    fn try_from(code: u16) -> std::result::Result<Self, u16> {
        match code {
            1 => Ok(FrameKind::Header),
            2 => Ok(FrameKind::Body),
            other => Err(other),
        }
    }
}

/// The fixed-size part in front of every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prelude {
    pub kind: FrameKind,
    pub len: usize,
}

impl Prelude {
    /// Validate raw prelude bytes against the magic and `max_payload`.
    pub fn parse(raw: &[u8; PRELUDE_LEN], max_payload: usize) -> Result<Self> {
        if raw[..2] != MAGIC {
            return Err(CodecError::InvalidMagic);
        }
        let len = u32::from_le_bytes([raw[2], raw[3], raw[4], raw[5]]) as usize;
        let code = u16::from_le_bytes([raw[6], raw[7]]);

        let kind = FrameKind::try_from(code).map_err(|got| CodecError::UnexpectedFrame {
            expected: FrameKind::Header.code(),
            got,
        })?;
        if len > max_payload {
            return Err(CodecError::PayloadTooLarge {
                size: len,
                max: max_payload,
            });
        }
        Ok(Self { kind, len })
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_slice(&MAGIC);
        dst.put_u32_le(self.len as u32);
        dst.put_u16_le(self.kind.code());
    }
}

/// One decoded frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    pub payload: Bytes,
}

/// Append `payload` as a frame of `kind` to `dst`.
pub fn encode_frame(
    kind: FrameKind,
    payload: &[u8],
    max_payload: usize,
    dst: &mut BytesMut,
) -> Result<()> {
    let max = max_payload.min(u32::MAX as usize);
    if payload.len() > max {
        return Err(CodecError::PayloadTooLarge {
            size: payload.len(),
            max,
        });
    }
    dst.reserve(PRELUDE_LEN + payload.len());
    Prelude {
        kind,
        len: payload.len(),
    }
    .put(dst);
    dst.put_slice(payload);
    Ok(())
}

/// Limits shared by the codec readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest header or body accepted, in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
