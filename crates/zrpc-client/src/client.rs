use std::collections::HashMap;
use std::fmt;
use std::io::BufReader;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use zrpc_codec::{
    new_codec, write_options, Closer, Codec, CodecError, CodecReader, CodecType, CodecWriter,
    FrameConfig, Header, Options,
};
use zrpc_transport::RpcStream;

use crate::call::{Call, Pending, PendingCall, PendingEntry};
use crate::error::{ClientError, Result};

/// A connection to one zrpc server, safe to share between threads.
///
/// Lock order is always send lock, then status lock.
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    codec_type: CodecType,
    options: Options,
    sending: Mutex<Box<dyn CodecWriter>>,
    state: Mutex<State>,
    closer: Closer,
}

struct State {
    next_seq: u64,
    pending: HashMap<u64, Box<dyn Pending>>,
    /// Set by [`Client::close`].
    closing: bool,
    /// Set when the receiving side failed.
    shutdown: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Client {
    /// Send the handshake on `stream` and start the client over it.
    pub fn with_stream(mut stream: RpcStream, options: Options) -> Result<Self> {
        write_options(&mut stream, &options)?;
        let codec = new_codec(
            options.codec_type,
            BufReader::new(stream),
            FrameConfig::default(),
        )?;
        Ok(Self::new(codec, options))
    }

    /// Start a client over a codec whose handshake was already sent.
    pub fn new(codec: Codec, options: Options) -> Self {
        let Codec {
            codec_type,
            reader,
            writer,
            closer,
        } = codec;

        let inner = Arc::new(Inner {
            codec_type,
            options,
            sending: Mutex::new(writer),
            state: Mutex::new(State {
                next_seq: 1,
                pending: HashMap::new(),
                closing: false,
                shutdown: false,
            }),
            closer,
        });

        let receiver = Arc::clone(&inner);
        std::thread::spawn(move || receive(receiver, reader));

        Self { inner }
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// Start a call and return at once.
    ///
    /// The finished [`Call`] is delivered on `done`. Returns the call's
    /// sequence number, or `0` if the client was already shut down, in which
    /// case the call has been completed with [`ClientError::Shutdown`].
    pub fn async_call_with<A, R>(
        &self,
        service_method: &str,
        args: &A,
        done: Sender<Call<R>>,
    ) -> u64
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let entry = Box::new(PendingEntry {
            service_method: service_method.to_string(),
            done,
        });
        self.inner.send(service_method, args, entry)
    }

    /// Start a call and return a handle to wait on.
    pub fn async_call<A, R>(&self, service_method: &str, args: &A) -> PendingCall<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let seq = self.async_call_with(service_method, args, tx);
        PendingCall::new(seq, rx)
    }

    /// Call and block until the reply arrives.
    pub fn call<A, R>(&self, service_method: &str, args: &A) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        self.call_deadline(None, service_method, args)
    }

    /// Call and give up after `timeout`. A zero timeout, or one too large to
    /// express as a deadline, waits forever.
    pub fn call_timeout<A, R>(&self, timeout: Duration, service_method: &str, args: &A) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let deadline = if timeout.is_zero() {
            None
        } else {
            Instant::now().checked_add(timeout)
        };
        self.call_deadline(deadline, service_method, args)
    }

    /// Call and give up at `deadline`.
    ///
    /// On expiry the call leaves the pending table; a response arriving
    /// later is read and dropped.
    pub fn call_deadline<A, R>(
        &self,
        deadline: Option<Instant>,
        service_method: &str,
        args: &A,
    ) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let seq = self.async_call_with(service_method, args, tx);

        let call: Call<R> = match deadline {
            None => rx.recv().map_err(|_| ClientError::Shutdown)?,
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(call) => call,
                    Err(RecvTimeoutError::Timeout) => {
                        self.inner.remove_call(seq);
                        debug!(seq, service_method, "call timed out");
                        return Err(ClientError::CallTimeout {
                            service_method: service_method.to_string(),
                            seq,
                        });
                    }
                    Err(RecvTimeoutError::Disconnected) => return Err(ClientError::Shutdown),
                }
            }
        };
        call.into_result()
    }

    /// Close the connection. Calls still in flight complete with an error.
    ///
    /// Closing twice returns [`ClientError::Shutdown`].
    pub fn close(&self) -> Result<()> {
        let mut state = lock(&self.inner.state);
        if state.closing {
            return Err(ClientError::Shutdown);
        }
        state.closing = true;
        self.inner.closer.close()?;
        Ok(())
    }

    /// Whether new calls can still be made.
    pub fn is_available(&self) -> bool {
        let state = lock(&self.inner.state);
        !state.closing && !state.shutdown
    }

    /// Number of calls awaiting a response.
    pub fn pending_len(&self) -> usize {
        lock(&self.inner.state).pending.len()
    }

    pub fn is_pending(&self, seq: u64) -> bool {
        lock(&self.inner.state).pending.contains_key(&seq)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("codec_type", &self.inner.codec_type)
            .field("available", &self.is_available())
            .field("pending", &self.pending_len())
            .finish()
    }
}

impl Inner {
    fn register_call(&self, entry: Box<dyn Pending>) -> std::result::Result<u64, Box<dyn Pending>> {
        let mut state = lock(&self.state);
        if state.closing || state.shutdown {
            return Err(entry);
        }
        let seq = state.next_seq;
        state.pending.insert(seq, entry);
        state.next_seq += 1;
        Ok(seq)
    }

    fn remove_call(&self, seq: u64) -> Option<Box<dyn Pending>> {
        lock(&self.state).pending.remove(&seq)
    }

    fn send<A: Serialize + ?Sized>(
        &self,
        service_method: &str,
        args: &A,
        entry: Box<dyn Pending>,
    ) -> u64 {
        let mut writer = lock(&self.sending);

        let seq = match self.register_call(entry) {
            Ok(seq) => seq,
            Err(entry) => {
                entry.complete(0, self.codec_type, Err(ClientError::Shutdown));
                return 0;
            }
        };

        let header = Header::request(service_method, seq);
        let written = self
            .codec_type
            .encode(args)
            .and_then(|body| writer.write(&header, &body));

        if let Err(err) = written {
            debug!(seq, service_method, error = %err, "request write failed");
            // The receiving side may already have failed this call.
            if let Some(entry) = self.remove_call(seq) {
                entry.complete(seq, self.codec_type, Err(err.into()));
            }
        }
        seq
    }

    /// Fail every outstanding call after the connection broke.
    fn terminate(&self, err: &CodecError) {
        let _sending = lock(&self.sending);
        let mut state = lock(&self.state);
        state.shutdown = true;

        let reason = err.to_string();
        for (seq, entry) in state.pending.drain() {
            entry.complete(
                seq,
                self.codec_type,
                Err(ClientError::Disconnected(reason.clone())),
            );
        }
    }
}

fn receive(inner: Arc<Inner>, mut reader: Box<dyn CodecReader>) {
    let err = loop {
        let header = match reader.read_header() {
            Ok(header) => header,
            Err(err) => break err,
        };
        let entry = inner.remove_call(header.seq);
        let body = match reader.read_body() {
            Ok(body) => body,
            Err(err) => {
                if let Some(entry) = entry {
                    entry.complete(
                        header.seq,
                        inner.codec_type,
                        Err(ClientError::Disconnected(err.to_string())),
                    );
                }
                break err;
            }
        };

        match entry {
            None => debug!(seq = header.seq, "dropping response to unknown call"),
            Some(entry) if header.is_error() => entry.complete(
                header.seq,
                inner.codec_type,
                Err(ClientError::Remote(header.error)),
            ),
            Some(entry) => entry.complete(header.seq, inner.codec_type, Ok(body)),
        }
    };

    let closing = lock(&inner.state).closing;
    if closing && err.is_closed() {
        debug!("client closed");
    } else if err.is_closed() {
        debug!("server closed the connection");
    } else {
        warn!(error = %err, "client receive failed");
    }
    inner.terminate(&err);
}
