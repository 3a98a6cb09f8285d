use crate::kind::ErrorKind;

/// Errors that can occur while framing or encoding messages.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The frame header contains an invalid magic number.
    #[error("codec error: invalid frame magic (expected 0x5a52 \"ZR\")")]
    InvalidMagic,

    /// The payload exceeds the configured maximum size.
    #[error("codec error: payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A header frame arrived where a body was expected, or vice versa.
    #[error("codec error: unexpected frame kind {got} (expected {expected})")]
    UnexpectedFrame { expected: u16, got: u16 },

    /// A value could not be encoded.
    #[error("codec error: encode failed: {0}")]
    Encode(String),

    /// Bytes could not be decoded into the requested value.
    #[error("codec error: decode failed: {0}")]
    Decode(String),

    /// An I/O error occurred while reading or writing.
    #[error("codec error: I/O: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed at or inside a message boundary.
    #[error("codec error: connection closed")]
    ConnectionClosed,

    /// The handshake line was missing or malformed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The handshake named the wrong protocol.
    #[error("handshake failed: magic number mismatch (expected {expected:#x}, got {got:#x})")]
    MagicNumberMismatch { expected: u32, got: u32 },

    /// Shutting down the underlying stream failed.
    #[error("transport error: {0}")]
    Transport(#[from] zrpc_transport::TransportError),
}

impl CodecError {
    /// Closed classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::Handshake(_) | CodecError::MagicNumberMismatch { .. } => {
                ErrorKind::Handshake
            }
            CodecError::Transport(_) => ErrorKind::Transport,
            _ => ErrorKind::Codec,
        }
    }

    /// Whether this is a clean end-of-stream rather than a framing failure.
    pub fn is_closed(&self) -> bool {
        match self {
            CodecError::ConnectionClosed => true,
            CodecError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
