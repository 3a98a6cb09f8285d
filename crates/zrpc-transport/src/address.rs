use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::TransportError;

/// A dialable / bindable endpoint.
///
/// Textual form is `network@address`; a string without `@` is taken as a
/// TCP `host:port`. This is also the form servers announce to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// TCP `host:port`.
    Tcp(String),
    /// Filesystem path of a Unix domain socket.
    Unix(PathBuf),
}

impl Address {
    /// Network name used in the textual form.
    pub fn network(&self) -> &'static str {
        match self {
            Address::Tcp(_) => "tcp",
            Address::Unix(_) => "unix",
        }
    }
}

impl FromStr for Address {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (network, addr) = match s.split_once('@') {
            Some((network, addr)) => (network, addr),
            None => ("tcp", s),
        };

        if addr.is_empty() {
            return Err(TransportError::InvalidAddress(s.to_string()));
        }

        match network {
            "tcp" => {
                if !addr.contains(':') {
                    return Err(TransportError::InvalidAddress(s.to_string()));
                }
                Ok(Address::Tcp(addr.to_string()))
            }
            "unix" => Ok(Address::Unix(PathBuf::from(addr))),
            other => Err(TransportError::UnsupportedNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Tcp(addr) => write!(f, "tcp@{addr}"),
            Address::Unix(path) => write!(f, "unix@{}", path.display()),
        }
    }
}
