use std::io::{BufRead, BufReader, Read, Write};

use bytes::Bytes;
use tracing::debug;
use zrpc_transport::RpcStream;

use crate::codec::{CodecReader, CodecWriter};
use crate::error::{CodecError, Result};
use crate::frame::FrameConfig;
use crate::header::Header;

/// Read one `\n`-terminated line of at most `max` bytes (terminator excluded).
///
/// End-of-stream before or inside a line is `ConnectionClosed`.
pub(crate) fn read_line<R: BufRead>(reader: &mut R, max: usize) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let limit = (max as u64).saturating_add(1);
    let n = reader.by_ref().take(limit).read_until(b'\n', &mut line)?;
    if n == 0 {
        return Err(CodecError::ConnectionClosed);
    }
    if line.last() != Some(&b'\n') {
        if line.len() > max {
            return Err(CodecError::PayloadTooLarge {
                size: line.len(),
                max,
            });
        }
        return Err(CodecError::ConnectionClosed);
    }
    line.pop();
    Ok(line)
}

pub(crate) struct JsonReader {
    stream: BufReader<RpcStream>,
    config: FrameConfig,
}

impl JsonReader {
    pub(crate) fn new(stream: BufReader<RpcStream>, config: FrameConfig) -> Self {
        Self { stream, config }
    }
}

impl CodecReader for JsonReader {
    fn read_header(&mut self) -> Result<Header> {
        let line = read_line(&mut self.stream, self.config.max_payload_size)?;
        serde_json::from_slice(&line).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn read_body(&mut self) -> Result<Bytes> {
        read_line(&mut self.stream, self.config.max_payload_size).map(Bytes::from)
    }
}

pub(crate) struct JsonWriter {
    stream: RpcStream,
    config: FrameConfig,
    buf: Vec<u8>,
}

impl JsonWriter {
    pub(crate) fn new(stream: RpcStream, config: FrameConfig) -> Self {
        Self {
            stream,
            config,
            buf: Vec::new(),
        }
    }

    fn try_write(&mut self, header: &Header, body: &[u8]) -> Result<()> {
        if body.contains(&b'\n') {
            return Err(CodecError::Encode(
                "json body must not contain a newline".to_string(),
            ));
        }
        if body.len() > self.config.max_payload_size {
            return Err(CodecError::PayloadTooLarge {
                size: body.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        serde_json::to_writer(&mut self.buf, header)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        self.buf.push(b'\n');
        self.buf.extend_from_slice(body);
        self.buf.push(b'\n');

        self.stream.write_all(&self.buf)?;
        self.stream.flush()?;
        Ok(())
    }
}

impl CodecWriter for JsonWriter {
    fn write(&mut self, header: &Header, body: &[u8]) -> Result<()> {
        let result = self.try_write(header, body);
        if let Err(err) = &result {
            debug!(error = %err, seq = header.seq, "json write failed; closing connection");
            let _ = self.stream.shutdown();
        }
        result
    }
}
