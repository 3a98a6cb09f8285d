//! zrpc server.
//!
//! A [`Server`] owns a [`ServiceMap`](zrpc_service::ServiceMap) and serves
//! connections from an [`RpcListener`](zrpc_transport::RpcListener). Every
//! connection handshakes, then handles each request on its own thread; all
//! responses on a connection are written through one lock so frames never
//! interleave.

mod conn;
pub mod error;
pub mod server;

pub use error::{Result, ServerError};
pub use server::{Server, ServerConfig};
