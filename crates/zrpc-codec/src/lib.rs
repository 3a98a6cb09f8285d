//! Wire protocol for zrpc connections.
//!
//! A connection carries, in order:
//! - one handshake line: the JSON-encoded [`Options`] terminated by `\n`,
//!   always textual since the body codec is not known yet;
//! - a stream of ([`Header`], body) pairs in the codec the handshake named.
//!
//! Two codecs ship with the crate: a compact binary one (length-prefixed
//! frames carrying `postcard` payloads) and newline-delimited JSON.

pub mod codec;
pub mod error;
pub mod frame;
pub mod header;
pub mod kind;
pub mod options;
pub mod reader;
pub mod writer;

mod binary;
mod json;

pub use codec::{new_codec, Closer, Codec, CodecReader, CodecType, CodecWriter, INVALID_REQUEST};
pub use error::{CodecError, Result};
pub use frame::{encode_frame, Frame, FrameConfig, FrameKind, Prelude, DEFAULT_MAX_PAYLOAD};
pub use header::Header;
pub use kind::ErrorKind;
pub use options::{read_options, write_options, Options, MAGIC_NUMBER, MAX_HANDSHAKE_LEN};
pub use reader::FrameReader;
pub use writer::FrameWriter;
