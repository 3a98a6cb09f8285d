use std::time::Duration;

use zrpc_codec::{CodecError, ErrorKind};
use zrpc_transport::TransportError;

/// Errors a client call can complete with.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The client was closed before or while the call was made.
    #[error("connection is shut down")]
    Shutdown,

    /// The connection failed; every outstanding call completes with this.
    #[error("connection is shut down: {0}")]
    Disconnected(String),

    #[error("connect timeout: expect within {0:?}")]
    ConnectTimeout(Duration),

    /// No response arrived before the caller's deadline.
    #[error("call timeout: no response to {service_method} (seq {seq})")]
    CallTimeout { service_method: String, seq: u64 },

    /// The server answered with an error header.
    #[error("{0}")]
    Remote(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Shutdown | ClientError::Disconnected(_) => ErrorKind::Shutdown,
            ClientError::ConnectTimeout(_) => ErrorKind::ConnectTimeout,
            ClientError::CallTimeout { .. } => ErrorKind::CallTimeout,
            ClientError::Remote(message) => ErrorKind::classify_remote(message),
            ClientError::Codec(err) => err.kind(),
            ClientError::Transport(_) => ErrorKind::Transport,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_keep_their_server_kind() {
        let err = ClientError::Remote("service not found: Bar".to_string());
        assert_eq!(err.kind(), ErrorKind::NotFoundService);

        let err = ClientError::Remote("divide by zero".to_string());
        assert_eq!(err.kind(), ErrorKind::Application);
    }

    #[test]
    fn local_errors_carry_kind_prefixes() {
        let cases = [
            ClientError::Shutdown,
            ClientError::Disconnected("codec error: connection closed".to_string()),
            ClientError::ConnectTimeout(Duration::from_secs(1)),
            ClientError::CallTimeout {
                service_method: "Foo.Sum".to_string(),
                seq: 3,
            },
            ClientError::Codec(CodecError::ConnectionClosed),
        ];
        for err in cases {
            assert_eq!(ErrorKind::classify_remote(&err.to_string()), err.kind());
        }
    }
}
