//! zrpc client.
//!
//! One [`Client`] owns one connection and multiplexes any number of
//! concurrent calls over it. Each call gets a sequence number; a single
//! receiving thread matches responses back to waiting callers by that
//! number, in whatever order the server answers.

pub mod call;
pub mod client;
pub mod dial;
pub mod error;

pub use call::{Call, PendingCall};
pub use client::Client;
pub use dial::{dial, dial_address};
pub use error::{ClientError, Result};
