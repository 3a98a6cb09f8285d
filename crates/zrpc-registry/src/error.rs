use zrpc_codec::ErrorKind;

/// Errors from running or talking to a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("transport error: failed to bind registry on {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("transport error: registry server failed: {0}")]
    Serve(std::io::Error),

    #[error("transport error: registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry answered with a non-success status.
    #[error("transport error: registry responded {0}")]
    Status(u16),
}

impl RegistryError {
    /// Every registry failure is a transport failure from the caller's side.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Transport
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
