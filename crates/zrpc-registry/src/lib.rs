//! Discovery registry for zrpc.
//!
//! Servers announce themselves with periodic heartbeats; a server is alive
//! while its last heartbeat is younger than the registry timeout. The
//! registry is exposed over HTTP at a single path:
//!
//! - `GET` answers with the alive servers, comma separated, in the
//!   `X-Zrpc-Servers` header;
//! - `POST` with an `X-Zrpc-Server` header records a heartbeat for that
//!   address (a missing header is a 500);
//! - any other method is a 405.

pub mod error;
pub mod heartbeat;
pub mod http;
pub mod registry;

pub use error::{RegistryError, Result};
pub use heartbeat::{discover, send_heartbeat, spawn_heartbeat};
pub use http::{router, serve, spawn, RegistryConfig, SERVERS_HEADER, SERVER_HEADER};
pub use registry::{Registry, DEFAULT_PATH, DEFAULT_TIMEOUT};
