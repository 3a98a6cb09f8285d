use zrpc_codec::ErrorKind;
use zrpc_service::ServiceError;
use zrpc_transport::TransportError;

/// Errors surfaced by server setup and the accept loop.
///
/// Failures inside a single request never surface here; they are sent back
/// to the caller as error responses.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Registering a service failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ServerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServerError::Transport(_) => ErrorKind::Transport,
            ServerError::Service(err) => err.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
