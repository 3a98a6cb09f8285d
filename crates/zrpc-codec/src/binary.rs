use std::io::BufReader;

use bytes::Bytes;
use tracing::debug;
use zrpc_transport::RpcStream;

use crate::codec::{CodecReader, CodecWriter};
use crate::error::{CodecError, Result};
use crate::frame::{FrameConfig, FrameKind};
use crate::header::Header;
use crate::reader::FrameReader;
use crate::writer::FrameWriter;

pub(crate) struct BinaryReader {
    frames: FrameReader<BufReader<RpcStream>>,
}

impl BinaryReader {
    pub(crate) fn new(stream: BufReader<RpcStream>, config: FrameConfig) -> Self {
        Self {
            frames: FrameReader::with_config(stream, config),
        }
    }
}

impl CodecReader for BinaryReader {
    fn read_header(&mut self) -> Result<Header> {
        let payload = self.frames.read_kind(FrameKind::Header)?;
        postcard::from_bytes(&payload).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn read_body(&mut self) -> Result<Bytes> {
        self.frames.read_kind(FrameKind::Body)
    }
}

pub(crate) struct BinaryWriter {
    frames: FrameWriter<RpcStream>,
}

impl BinaryWriter {
    pub(crate) fn new(stream: RpcStream, config: FrameConfig) -> Self {
        Self {
            frames: FrameWriter::with_config(stream, config),
        }
    }

    fn try_write(&mut self, header: &Header, body: &[u8]) -> Result<()> {
        let header =
            postcard::to_allocvec(header).map_err(|e| CodecError::Encode(e.to_string()))?;
        self.frames
            .send_all(&[(FrameKind::Header, &header), (FrameKind::Body, body)])
    }
}

impl CodecWriter for BinaryWriter {
    fn write(&mut self, header: &Header, body: &[u8]) -> Result<()> {
        let result = self.try_write(header, body);
        if let Err(err) = &result {
            debug!(error = %err, seq = header.seq, "binary write failed; closing connection");
            let _ = self.frames.get_ref().shutdown();
        }
        result
    }
}
