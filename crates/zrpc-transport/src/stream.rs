use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::address::Address;
use crate::error::{Result, TransportError};

/// A connected byte stream — implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations. A
/// stream can be cloned into independent handles so one thread reads while
/// others write; [`RpcStream::shutdown`] on any handle unblocks them all.
pub struct RpcStream {
    inner: RpcStreamInner,
}

enum RpcStreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for RpcStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            RpcStreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for RpcStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            RpcStreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            RpcStreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl From<TcpStream> for RpcStream {
    fn from(stream: TcpStream) -> Self {
        let _ = stream.set_nodelay(true);
        Self {
            inner: RpcStreamInner::Tcp(stream),
        }
    }
}

#[cfg(unix)]
impl From<std::os::unix::net::UnixStream> for RpcStream {
    fn from(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: RpcStreamInner::Unix(stream),
        }
    }
}

impl RpcStream {
    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            RpcStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            RpcStreamInner::Tcp(stream) => RpcStreamInner::Tcp(stream.try_clone()?),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => RpcStreamInner::Unix(stream.try_clone()?),
        };
        Ok(Self { inner })
    }

    /// Shut down both directions of the connection.
    ///
    /// Blocked readers on any clone of this stream observe end-of-stream.
    /// Shutting down an already disconnected stream is not an error.
    pub fn shutdown(&self) -> Result<()> {
        let res = match &self.inner {
            RpcStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => stream.shutdown(Shutdown::Both),
        };
        match res {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Human-readable remote endpoint, for logging.
    pub fn peer_label(&self) -> String {
        match &self.inner {
            RpcStreamInner::Tcp(stream) => stream
                .peer_addr()
                .map(|a| format!("tcp@{a}"))
                .unwrap_or_else(|_| "tcp@unknown".to_string()),
            #[cfg(unix)]
            RpcStreamInner::Unix(_) => "unix@peer".to_string(),
        }
    }
}

impl std::fmt::Debug for RpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            RpcStreamInner::Tcp(_) => f.debug_struct("RpcStream").field("type", &"tcp").finish(),
            #[cfg(unix)]
            RpcStreamInner::Unix(_) => f.debug_struct("RpcStream").field("type", &"unix").finish(),
        }
    }
}

/// Connect to `address`.
///
/// For TCP every resolved socket address is tried in turn; `timeout` bounds
/// each attempt (`None` = OS default).
pub fn connect(address: &Address, timeout: Option<Duration>) -> Result<RpcStream> {
    match address {
        Address::Tcp(addr) => connect_tcp(addr, timeout),
        #[cfg(unix)]
        Address::Unix(path) => crate::uds::connect(path),
        #[cfg(not(unix))]
        Address::Unix(_) => Err(TransportError::UnsupportedNetwork("unix".to_string())),
    }
}

fn connect_tcp(addr: &str, timeout: Option<Duration>) -> Result<RpcStream> {
    let socket_addrs = addr.to_socket_addrs().map_err(|e| TransportError::Connect {
        address: addr.to_string(),
        source: e,
    })?;

    let mut last_err = None;
    for socket_addr in socket_addrs {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&socket_addr, timeout),
            None => TcpStream::connect(socket_addr),
        };
        match attempt {
            Ok(stream) => {
                debug!(%socket_addr, "connected over tcp");
                return Ok(RpcStream::from(stream));
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(TransportError::Connect {
        address: addr.to_string(),
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "address resolved to nothing",
            )
        }),
    })
}
