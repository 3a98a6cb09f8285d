//! Stream transport abstraction for zrpc.
//!
//! Provides a unified interface over the byte-stream transports a zrpc
//! connection can run on:
//! - TCP (`tcp@host:port`, or a bare `host:port`)
//! - Unix domain sockets (`unix@/path/to/socket`, Unix only)
//!
//! This is the lowest layer of zrpc. Codecs, clients and servers all build
//! on the [`RpcStream`] type provided here.

pub mod address;
pub mod error;
pub mod listener;
pub mod stream;

#[cfg(unix)]
mod uds;

pub use address::Address;
pub use error::{Result, TransportError};
pub use listener::RpcListener;
pub use stream::{connect, RpcStream};

#[cfg(unix)]
pub use uds::SOCKET_MODE;
