use std::fmt;

/// Closed classification of every failure zrpc reports.
///
/// Each kind except [`ErrorKind::Application`] owns a stable message prefix.
/// Errors that cross the wire travel as plain strings in a response header,
/// and [`ErrorKind::classify_remote`] recovers the kind from that prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The client was closed, or its connection failed.
    Shutdown,
    /// Connecting plus handshaking did not finish in time.
    ConnectTimeout,
    /// A blocking call's deadline passed before the response arrived.
    CallTimeout,
    /// The server gave up waiting for a method to finish.
    HandleTimeout,
    NotFoundService,
    NotFoundMethod,
    /// A `"Service.Method"` string that does not split into two parts.
    MalformedName,
    ServiceExists,
    Handshake,
    Codec,
    Transport,
    /// Anything a service method itself returned.
    Application,
}

const PREFIXED: [ErrorKind; 11] = [
    ErrorKind::Shutdown,
    ErrorKind::ConnectTimeout,
    ErrorKind::CallTimeout,
    ErrorKind::HandleTimeout,
    ErrorKind::NotFoundService,
    ErrorKind::NotFoundMethod,
    ErrorKind::MalformedName,
    ErrorKind::ServiceExists,
    ErrorKind::Handshake,
    ErrorKind::Codec,
    ErrorKind::Transport,
];

impl ErrorKind {
    /// The message prefix errors of this kind start with.
    pub const fn prefix(self) -> Option<&'static str> {
        match self {
            ErrorKind::Shutdown => Some("connection is shut down"),
            ErrorKind::ConnectTimeout => Some("connect timeout"),
            ErrorKind::CallTimeout => Some("call timeout"),
            ErrorKind::HandleTimeout => Some("handle timeout"),
            ErrorKind::NotFoundService => Some("service not found"),
            ErrorKind::NotFoundMethod => Some("method not found"),
            ErrorKind::MalformedName => Some("malformed service/method name"),
            ErrorKind::ServiceExists => Some("service already exists"),
            ErrorKind::Handshake => Some("handshake failed"),
            ErrorKind::Codec => Some("codec error"),
            ErrorKind::Transport => Some("transport error"),
            ErrorKind::Application => None,
        }
    }

    /// Classify an error message received from a peer.
    pub fn classify_remote(message: &str) -> ErrorKind {
        PREFIXED
            .into_iter()
            .find(|kind| {
                kind.prefix()
                    .is_some_and(|prefix| message.starts_with(prefix))
            })
            .unwrap_or(ErrorKind::Application)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Shutdown => "shutdown",
            ErrorKind::ConnectTimeout => "connect_timeout",
            ErrorKind::CallTimeout => "call_timeout",
            ErrorKind::HandleTimeout => "handle_timeout",
            ErrorKind::NotFoundService => "not_found_service",
            ErrorKind::NotFoundMethod => "not_found_method",
            ErrorKind::MalformedName => "malformed_name",
            ErrorKind::ServiceExists => "service_exists",
            ErrorKind::Handshake => "handshake",
            ErrorKind::Codec => "codec",
            ErrorKind::Transport => "transport",
            ErrorKind::Application => "application",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
