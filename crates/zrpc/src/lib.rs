//! Multiplexed remote procedure calls.
//!
//! A [`Client`] calls `"Service.Method"` on a [`Server`] over one persistent
//! TCP or Unix-socket connection. Calls are multiplexed by sequence number,
//! bodies travel in the codec chosen at handshake (compact binary or JSON),
//! and servers can announce themselves to a discovery registry.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP / Unix domain socket streams and addresses
//! - [`codec`] — handshake, header/body framing, body codecs, error kinds
//! - [`service`] — service method tables and dispatch
//! - [`client`] — the call multiplexer
//! - [`server`] — connection handling and request dispatch
//! - [`registry`] — heartbeat registry (behind the `registry` feature)
//!
//! ```no_run
//! use zrpc::demo::{arith_service, Args};
//! use zrpc::transport::{Address, RpcListener};
//! use zrpc::{dial, Options, Server};
//!
//! let listener = RpcListener::bind(&"tcp@127.0.0.1:9999".parse::<Address>()?)?;
//! let mut server = Server::new();
//! server.register(arith_service())?;
//! std::thread::spawn(move || server.accept(&listener));
//!
//! let client = dial("tcp@127.0.0.1:9999", Options::default())?;
//! let sum: i64 = client.call("Arith.Sum", &Args { num1: 3, num2: 4 })?;
//! assert_eq!(sum, 7);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod demo;

/// Re-export transport types.
pub mod transport {
    pub use zrpc_transport::*;
}

/// Re-export codec and handshake types.
pub mod codec {
    pub use zrpc_codec::*;
}

/// Re-export service dispatch types.
pub mod service {
    pub use zrpc_service::*;
}

/// Re-export client types.
pub mod client {
    pub use zrpc_client::*;
}

/// Re-export server types.
pub mod server {
    pub use zrpc_server::*;
}

/// Re-export registry types (requires `registry` feature).
#[cfg(feature = "registry")]
pub mod registry {
    pub use zrpc_registry::*;
}

pub use zrpc_client::{dial, Call, Client, ClientError};
pub use zrpc_codec::{CodecType, ErrorKind, Options};
pub use zrpc_server::{Server, ServerConfig};
pub use zrpc_service::{ServiceBuilder, ServiceError};
