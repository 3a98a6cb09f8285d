use std::path::PathBuf;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The address string could not be parsed.
    #[error("invalid address '{0}': expected tcp@host:port, unix@/path or host:port")]
    InvalidAddress(String),

    /// The address names a network this platform cannot serve.
    #[error("unsupported network '{0}'")]
    UnsupportedNetwork(String),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },
}

impl TransportError {
    /// Whether the underlying cause is an elapsed I/O timeout.
    pub fn is_timeout(&self) -> bool {
        let io = match self {
            TransportError::Connect { source, .. } | TransportError::Bind { source, .. } => source,
            TransportError::Accept(io) | TransportError::Io(io) => io,
            _ => return false,
        };
        matches!(
            io.kind(),
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
