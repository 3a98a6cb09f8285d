use std::io::Write;

use bytes::BytesMut;

use crate::error::{CodecError, Result};
use crate::frame::{encode_frame, FrameConfig, FrameKind};

/// Blocking frame writer.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            config,
        }
    }

    /// Write `frames` back to back with a single `write_all`, then flush.
    ///
    /// Every frame is encoded before anything is written, so an oversized
    /// body never leaves its header orphaned on the wire.
    pub fn send_all(&mut self, frames: &[(FrameKind, &[u8])]) -> Result<()> {
        self.buf.clear();
        for (kind, payload) in frames {
            encode_frame(*kind, payload, self.config.max_payload_size, &mut self.buf)?;
        }
        self.inner.write_all(&self.buf).map_err(CodecError::Io)?;
        self.inner.flush().map_err(CodecError::Io)
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }
}
