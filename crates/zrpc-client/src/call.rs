use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use zrpc_codec::CodecType;

use crate::error::{ClientError, Result};

/// One finished remote invocation.
#[derive(Debug)]
pub struct Call<R> {
    /// Zero when the call was never registered (client already shut down).
    pub seq: u64,
    pub service_method: String,
    pub reply: Option<R>,
    pub error: Option<ClientError>,
}

impl<R> Call<R> {
    pub fn into_result(self) -> Result<R> {
        match (self.error, self.reply) {
            (Some(err), _) => Err(err),
            (None, Some(reply)) => Ok(reply),
            (None, None) => Err(ClientError::Shutdown),
        }
    }
}

/// Handle returned by [`Client::async_call`](crate::Client::async_call).
#[derive(Debug)]
pub struct PendingCall<R> {
    seq: u64,
    done: Receiver<Call<R>>,
}

impl<R> PendingCall<R> {
    pub(crate) fn new(seq: u64, done: Receiver<Call<R>>) -> Self {
        Self { seq, done }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Block until the call completes.
    pub fn wait(self) -> Call<R> {
        let seq = self.seq;
        self.done.recv().unwrap_or_else(|_| Call {
            seq,
            service_method: String::new(),
            reply: None,
            error: Some(ClientError::Shutdown),
        })
    }

    /// The completed call, if it has completed.
    pub fn try_wait(&self) -> Option<Call<R>> {
        match self.done.try_recv() {
            Ok(call) => Some(call),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Call {
                seq: self.seq,
                service_method: String::new(),
                reply: None,
                error: Some(ClientError::Shutdown),
            }),
        }
    }
}

/// Type-erased entry of the pending call table.
pub(crate) trait Pending: Send {
    /// Finish the call with a raw reply body or an error. Runs exactly once.
    fn complete(self: Box<Self>, seq: u64, codec_type: CodecType, outcome: Result<Bytes>);
}

pub(crate) struct PendingEntry<R> {
    pub(crate) service_method: String,
    pub(crate) done: Sender<Call<R>>,
}

impl<R: DeserializeOwned + Send + 'static> Pending for PendingEntry<R> {
    fn complete(self: Box<Self>, seq: u64, codec_type: CodecType, outcome: Result<Bytes>) {
        let (reply, error) = match outcome.and_then(|body| Ok(codec_type.decode::<R>(&body)?)) {
            Ok(reply) => (Some(reply), None),
            Err(err) => (None, Some(err)),
        };
        // The caller may have stopped waiting.
        let _ = self.done.send(Call {
            seq,
            service_method: self.service_method,
            reply,
            error,
        });
    }
}
