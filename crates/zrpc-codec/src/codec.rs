use std::fmt;
use std::io::BufReader;
use std::str::FromStr;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zrpc_transport::RpcStream;

use crate::error::{CodecError, Result};
use crate::frame::FrameConfig;
use crate::header::Header;

/// Body sent with every error response the server produces itself.
pub const INVALID_REQUEST: &str = "invalid request";

/// Body encoding negotiated in the handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecType {
    /// Length-prefixed frames carrying `postcard` payloads.
    #[default]
    #[serde(rename = "application/binary")]
    Binary,
    /// Newline-delimited JSON.
    #[serde(rename = "application/json")]
    Json,
}

impl CodecType {
    pub const fn as_str(self) -> &'static str {
        match self {
            CodecType::Binary => "application/binary",
            CodecType::Json => "application/json",
        }
    }

    /// Encode a value as a body in this codec.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            CodecType::Binary => {
                postcard::to_allocvec(value).map_err(|e| CodecError::Encode(e.to_string()))
            }
            CodecType::Json => {
                serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
            }
        }
    }

    /// Decode a body produced by [`CodecType::encode`].
    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        match self {
            CodecType::Binary => {
                postcard::from_bytes(bytes).map_err(|e| CodecError::Decode(e.to_string()))
            }
            CodecType::Json => {
                serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
            }
        }
    }
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecType {
    type Err = CodecError;

    /// Accepts the wire identifiers and the short names `binary` / `json`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "application/binary" | "binary" => Ok(CodecType::Binary),
            "application/json" | "json" => Ok(CodecType::Json),
            other => Err(CodecError::Handshake(format!(
                "unknown codec type '{other}'"
            ))),
        }
    }
}

/// Read half of a codec. Owned by exactly one receiving thread.
pub trait CodecReader: Send {
    /// Read the next header. Clean end-of-stream is
    /// [`CodecError::ConnectionClosed`].
    fn read_header(&mut self) -> Result<Header>;

    /// Read the body that follows the last header, still encoded.
    fn read_body(&mut self) -> Result<Bytes>;
}

/// Write half of a codec. Callers serialize access with their own lock.
pub trait CodecWriter: Send {
    /// Write `header` then `body` and flush.
    ///
    /// Any failure shuts the connection down before returning.
    fn write(&mut self, header: &Header, body: &[u8]) -> Result<()>;
}

/// Shuts the connection down, unblocking the reader half.
#[derive(Debug)]
pub struct Closer {
    stream: RpcStream,
}

impl Closer {
    pub fn close(&self) -> Result<()> {
        self.stream.shutdown().map_err(Into::into)
    }
}

/// A connection split into its read half, write half and closer.
pub struct Codec {
    pub codec_type: CodecType,
    pub reader: Box<dyn CodecReader>,
    pub writer: Box<dyn CodecWriter>,
    pub closer: Closer,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("codec_type", &self.codec_type)
            .finish_non_exhaustive()
    }
}

/// Build a codec over an established connection.
///
/// `reader` may already have buffered bytes past the handshake line; they
/// are kept and read as the first header.
pub fn new_codec(
    codec_type: CodecType,
    reader: BufReader<RpcStream>,
    config: FrameConfig,
) -> Result<Codec> {
    let write_stream = reader.get_ref().try_clone()?;
    let closer = Closer {
        stream: reader.get_ref().try_clone()?,
    };

    let (reader, writer): (Box<dyn CodecReader>, Box<dyn CodecWriter>) = match codec_type {
        CodecType::Binary => (
            Box::new(crate::binary::BinaryReader::new(reader, config.clone())),
            Box::new(crate::binary::BinaryWriter::new(write_stream, config)),
        ),
        CodecType::Json => (
            Box::new(crate::json::JsonReader::new(reader, config.clone())),
            Box::new(crate::json::JsonWriter::new(write_stream, config)),
        ),
    };

    Ok(Codec {
        codec_type,
        reader,
        writer,
        closer,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use std::collections::BTreeMap;
    use std::os::unix::net::UnixStream;

    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Args {
        num1: i64,
        num2: i64,
    }

    fn pair(codec_type: CodecType) -> (Codec, Codec) {
        let (a, b) = UnixStream::pair().unwrap();
        let a = new_codec(
            codec_type,
            BufReader::new(RpcStream::from(a)),
            FrameConfig::default(),
        )
        .unwrap();
        let b = new_codec(
            codec_type,
            BufReader::new(RpcStream::from(b)),
            FrameConfig::default(),
        )
        .unwrap();
        (a, b)
    }

    fn exchange(codec_type: CodecType) {
        let (mut client, mut server) = pair(codec_type);

        let args = Args { num1: 3, num2: 4 };
        let body = codec_type.encode(&args).unwrap();
        client
            .writer
            .write(&Header::request("Foo.Sum", 1), &body)
            .unwrap();
        client
            .writer
            .write(&Header::request("Foo.Sum", 2), &body)
            .unwrap();

        for seq in 1..=2 {
            let header = server.reader.read_header().unwrap();
            assert_eq!(header.service_method, "Foo.Sum");
            assert_eq!(header.seq, seq);
            let body = server.reader.read_body().unwrap();
            let got: Args = codec_type.decode(&body).unwrap();
            assert_eq!(got, args);
        }

        let mut reply = Header::request("Foo.Sum", 1);
        reply.error = "service not found: Foo".to_string();
        let body = codec_type.encode(INVALID_REQUEST).unwrap();
        server.writer.write(&reply, &body).unwrap();

        let header = client.reader.read_header().unwrap();
        assert!(header.is_error());
        assert_eq!(header, reply);
        let body = client.reader.read_body().unwrap();
        let text: String = codec_type.decode(&body).unwrap();
        assert_eq!(text, INVALID_REQUEST);
    }

    #[test]
    fn binary_codec_exchanges_header_and_body() {
        exchange(CodecType::Binary);
    }

    #[test]
    fn json_codec_exchanges_header_and_body() {
        exchange(CodecType::Json);
    }

    #[test]
    fn close_unblocks_reader() {
        for codec_type in [CodecType::Binary, CodecType::Json] {
            let (mut client, _server) = pair(codec_type);
            let closer = client.closer;
            let handle = std::thread::spawn(move || client.reader.read_header());
            std::thread::sleep(std::time::Duration::from_millis(20));
            closer.close().unwrap();
            let err = handle.join().unwrap().unwrap_err();
            assert!(err.is_closed(), "{codec_type}: {err}");
        }
    }

    #[test]
    fn peer_hangup_is_connection_closed() {
        for codec_type in [CodecType::Binary, CodecType::Json] {
            let (mut client, server) = pair(codec_type);
            drop(server);
            let err = client.reader.read_header().unwrap_err();
            assert!(matches!(err, CodecError::ConnectionClosed), "{err}");
        }
    }

    #[test]
    fn codec_type_parses_wire_and_short_names() {
        assert_eq!("application/json".parse::<CodecType>().unwrap(), CodecType::Json);
        assert_eq!("binary".parse::<CodecType>().unwrap(), CodecType::Binary);
        let err = "application/gob".parse::<CodecType>().unwrap_err();
        assert!(matches!(err, CodecError::Handshake(_)));
    }

    #[test]
    fn json_body_is_plain_json() {
        let mut map = BTreeMap::new();
        map.insert("k", 1);
        let body = CodecType::Json.encode(&map).unwrap();
        assert_eq!(body, br#"{"k":1}"#);
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let err = CodecType::Json.decode::<Args>(b"not json").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
        let err = CodecType::Binary.decode::<Args>(&[]).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
