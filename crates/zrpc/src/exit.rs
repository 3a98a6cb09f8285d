use std::fmt;
use std::io;

use zrpc::client::ClientError;
use zrpc::codec::ErrorKind;
use zrpc::registry::RegistryError;
use zrpc::server::ServerError;
use zrpc::transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Exit code for an RPC failure class.
pub fn kind_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::ConnectTimeout | ErrorKind::CallTimeout | ErrorKind::HandleTimeout => TIMEOUT,
        ErrorKind::Transport | ErrorKind::Handshake => TRANSPORT_ERROR,
        ErrorKind::Codec => DATA_INVALID,
        ErrorKind::NotFoundService | ErrorKind::NotFoundMethod | ErrorKind::MalformedName => USAGE,
        ErrorKind::ServiceExists => INTERNAL,
        ErrorKind::Shutdown | ErrorKind::Application => FAILURE,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::InvalidAddress(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Transport(err) => transport_error(context, err),
        other => CliError::new(kind_code(other.kind()), format!("{context}: {other}")),
    }
}

pub fn server_error(context: &str, err: ServerError) -> CliError {
    match err {
        ServerError::Transport(err) => transport_error(context, err),
        other => CliError::new(kind_code(other.kind()), format!("{context}: {other}")),
    }
}

pub fn registry_error(context: &str, err: RegistryError) -> CliError {
    match err {
        RegistryError::Bind { source, .. } | RegistryError::Serve(source) => {
            io_error(context, source)
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}
