use std::net::TcpListener;

use tracing::{debug, info};

use crate::address::Address;
use crate::error::{Result, TransportError};
use crate::stream::RpcStream;

/// A bound listener on either transport.
pub struct RpcListener {
    inner: ListenerInner,
}

enum ListenerInner {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(crate::uds::UnixBinding),
}

impl RpcListener {
    /// Bind to `address`. A TCP port of `0` picks an ephemeral port; see
    /// [`RpcListener::local_address`] for the one actually bound.
    pub fn bind(address: &Address) -> Result<Self> {
        let inner = match address {
            Address::Tcp(addr) => {
                let listener = TcpListener::bind(addr.as_str()).map_err(|e| TransportError::Bind {
                    address: addr.clone(),
                    source: e,
                })?;
                info!(address = %addr, "listening on tcp");
                ListenerInner::Tcp(listener)
            }
            #[cfg(unix)]
            Address::Unix(path) => ListenerInner::Unix(crate::uds::bind(path)?),
            #[cfg(not(unix))]
            Address::Unix(_) => return Err(TransportError::UnsupportedNetwork("unix".to_string())),
        };
        Ok(Self { inner })
    }

    /// Accept the next connection (blocking).
    pub fn accept(&self) -> Result<RpcStream> {
        match &self.inner {
            ListenerInner::Tcp(listener) => {
                let (stream, peer) = listener.accept().map_err(TransportError::Accept)?;
                debug!(%peer, "accepted tcp connection");
                Ok(RpcStream::from(stream))
            }
            #[cfg(unix)]
            ListenerInner::Unix(listener) => listener.accept(),
        }
    }

    /// The address this listener is actually bound to.
    pub fn local_address(&self) -> Result<Address> {
        match &self.inner {
            ListenerInner::Tcp(listener) => Ok(Address::Tcp(listener.local_addr()?.to_string())),
            #[cfg(unix)]
            ListenerInner::Unix(listener) => Ok(Address::Unix(listener.path().to_path_buf())),
        }
    }
}
