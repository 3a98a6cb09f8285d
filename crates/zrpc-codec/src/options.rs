use std::io::{BufRead, Write};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::CodecType;
use crate::error::{CodecError, Result};
use crate::json::read_line;

/// Identifies a zrpc connection. Any other value in a handshake is fatal.
pub const MAGIC_NUMBER: u32 = 0x3bef5c;

/// Longest handshake line a server accepts.
pub const MAX_HANDSHAKE_LEN: usize = 4 * 1024;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection parameters the dialing side sends once, before any request.
///
/// Always travels as a single JSON line whatever codec it selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    pub magic_number: u32,
    #[serde(default)]
    pub codec_type: CodecType,
    /// Bound on connect plus handshake; zero means unlimited.
    #[serde(default = "default_connect_timeout", with = "duration_ms")]
    pub connect_timeout: Duration,
    /// Bound on each method invocation on the server; zero means unlimited.
    #[serde(default, with = "duration_ms")]
    pub handle_timeout: Duration,
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

impl Default for Options {
    fn default() -> Self {
        Self {
            magic_number: MAGIC_NUMBER,
            codec_type: CodecType::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handle_timeout: Duration::ZERO,
        }
    }
}

impl Options {
    pub fn with_codec(mut self, codec_type: CodecType) -> Self {
        self.codec_type = codec_type;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_handle_timeout(mut self, timeout: Duration) -> Self {
        self.handle_timeout = timeout;
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Send the handshake line.
pub fn write_options<W: Write>(writer: &mut W, options: &Options) -> Result<()> {
    let mut line =
        serde_json::to_vec(options).map_err(|e| CodecError::Handshake(e.to_string()))?;
    line.push(b'\n');
    writer.write_all(&line)?;
    writer.flush()?;
    Ok(())
}

/// Read and validate the handshake line.
///
/// Bytes after the line stay buffered in `reader`.
pub fn read_options<R: BufRead>(reader: &mut R, max_len: usize) -> Result<Options> {
    let line = match read_line(reader, max_len) {
        Ok(line) => line,
        Err(CodecError::PayloadTooLarge { size, max }) => {
            return Err(CodecError::Handshake(format!(
                "options line too long ({size} bytes, max {max})"
            )))
        }
        Err(err) => return Err(err),
    };

    let options: Options = serde_json::from_slice(&line)
        .map_err(|e| CodecError::Handshake(format!("invalid options: {e}")))?;

    if options.magic_number != MAGIC_NUMBER {
        return Err(CodecError::MagicNumberMismatch {
            expected: MAGIC_NUMBER,
            got: options.magic_number,
        });
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Cursor, Read};

    use super::*;
    use crate::kind::ErrorKind;

    #[test]
    fn defaults() {
        let opts = Options::default();
        assert_eq!(opts.magic_number, MAGIC_NUMBER);
        assert_eq!(opts.codec_type, CodecType::Binary);
        assert_eq!(opts.connect_timeout, Duration::from_secs(10));
        assert_eq!(opts.handle_timeout, Duration::ZERO);
    }

    #[test]
    fn wire_form_is_one_json_line() {
        let opts = Options::default()
            .with_codec(CodecType::Json)
            .with_handle_timeout(Duration::from_millis(1500));
        let mut out = Vec::new();
        write_options(&mut out, &opts).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);
        assert!(text.contains(r#""codecType":"application/json""#));
        assert!(text.contains(r#""handleTimeout":1500"#));
        assert!(text.contains(&format!(r#""magicNumber":{MAGIC_NUMBER}"#)));
    }

    #[test]
    fn read_keeps_trailing_bytes_buffered() {
        let mut wire = Vec::new();
        write_options(&mut wire, &Options::default()).unwrap();
        wire.extend_from_slice(b"next");

        let mut reader = BufReader::new(Cursor::new(wire));
        let opts = read_options(&mut reader, MAX_HANDSHAKE_LEN).unwrap();
        assert_eq!(opts, Options::default());

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"next");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let line = format!("{{\"magicNumber\":{MAGIC_NUMBER}}}\n");
        let opts = read_options(&mut Cursor::new(line.into_bytes()), MAX_HANDSHAKE_LEN).unwrap();
        assert_eq!(opts, Options::default());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let line = b"{\"magicNumber\":1,\"codecType\":\"application/binary\"}\n".to_vec();
        let err = read_options(&mut Cursor::new(line), MAX_HANDSHAKE_LEN).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MagicNumberMismatch { got: 1, .. }
        ));
        assert_eq!(err.kind(), ErrorKind::Handshake);
    }

    #[test]
    fn unknown_codec_is_rejected() {
        let line = format!(
            "{{\"magicNumber\":{MAGIC_NUMBER},\"codecType\":\"application/gob\"}}\n"
        );
        let err = read_options(&mut Cursor::new(line.into_bytes()), MAX_HANDSHAKE_LEN).unwrap_err();
        assert!(matches!(err, CodecError::Handshake(_)));
    }

    #[test]
    fn oversized_line_is_handshake_error() {
        let line = vec![b'x'; 64];
        let err = read_options(&mut Cursor::new(line), 16).unwrap_err();
        assert!(matches!(err, CodecError::Handshake(_)));
    }

    #[test]
    fn empty_stream_is_closed() {
        let err = read_options(&mut Cursor::new(Vec::new()), MAX_HANDSHAKE_LEN).unwrap_err();
        assert!(err.is_closed());
    }
}
