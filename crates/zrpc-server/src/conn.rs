use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Mutex, MutexGuard};
use std::thread::Scope;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, error, warn};
use zrpc_codec::{Codec, CodecType, CodecWriter, Header, INVALID_REQUEST};
use zrpc_service::{Argv, MethodType, Service, ServiceError, ServiceMap};

const PANICKED: &str = "method panicked";

/// Serialized write half shared by every request thread of a connection.
type Sending = Mutex<Box<dyn CodecWriter>>;

fn lock(sending: &Sending) -> MutexGuard<'_, Box<dyn CodecWriter>> {
    sending.lock().unwrap_or_else(|e| e.into_inner())
}

/// Serve requests until the connection can no longer be read, then wait
/// for every request thread (including invocations that outlived their
/// handling timeout) before closing.
pub(crate) fn serve_codec(services: &ServiceMap, codec: Codec, handle_timeout: Duration, peer: &str) {
    let Codec {
        codec_type,
        mut reader,
        writer,
        closer,
    } = codec;
    let sending: Sending = Mutex::new(writer);

    std::thread::scope(|s| {
        let sending = &sending;
        loop {
            let header = match reader.read_header() {
                Ok(header) => header,
                Err(err) => {
                    if !err.is_closed() {
                        warn!(%peer, error = %err, "read header failed");
                    }
                    break;
                }
            };
            let body = match reader.read_body() {
                Ok(body) => body,
                Err(err) => {
                    warn!(%peer, seq = header.seq, error = %err, "read body failed");
                    break;
                }
            };

            debug!(%peer, seq = header.seq, method = %header.service_method, "request");
            let request = Request {
                services,
                codec_type,
                sending,
                handle_timeout,
            };
            s.spawn(move || request.handle(s, header, body));
        }
    });

    if let Err(err) = closer.close() {
        debug!(%peer, error = %err, "close after drain failed");
    }
    debug!(%peer, "connection drained");
}

#[derive(Clone, Copy)]
struct Request<'a> {
    services: &'a ServiceMap,
    codec_type: CodecType,
    sending: &'a Sending,
    handle_timeout: Duration,
}

impl<'a> Request<'a> {
    fn handle<'scope>(self, s: &'scope Scope<'scope, '_>, header: Header, body: Bytes)
    where
        'a: 'scope,
    {
        let (service, method) = match self.services.resolve(&header.service_method) {
            Ok(found) => found,
            Err(err) => return self.send_error(header, err.to_string()),
        };
        let argv = match method.decode_argv(self.codec_type, &body) {
            Ok(argv) => argv,
            Err(err) => return self.send_error(header, err.to_string()),
        };

        if self.handle_timeout.is_zero() {
            self.invoke(service, method, header, argv);
            return;
        }

        let (called, wait_called) = mpsc::channel();
        let late_header = header.clone();
        s.spawn(move || {
            self.invoke(service, method, late_header, argv);
            let _ = called.send(());
        });

        match wait_called.recv_timeout(self.handle_timeout) {
            Ok(()) => {}
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    seq = header.seq,
                    method = %header.service_method,
                    timeout = ?self.handle_timeout,
                    "handle timeout; invocation keeps running"
                );
                let message = format!("handle timeout: expect within {:?}", self.handle_timeout);
                self.send_error(header, message);
            }
            Err(RecvTimeoutError::Disconnected) => {
                error!(seq = header.seq, "invocation thread ended without responding");
                self.send_error(header, ServiceError::application(PANICKED).to_string());
            }
        }
    }

    fn invoke(self, service: &Service, method: &MethodType, header: Header, argv: Argv) {
        let mut replyv = method.new_replyv();
        let invoked = panic::catch_unwind(AssertUnwindSafe(|| {
            service.invoke(method, argv, &mut replyv)
        }));
        match invoked {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return self.send_error(header, err.to_string()),
            Err(_) => {
                error!(seq = header.seq, method = %header.service_method, "method panicked");
                return self.send_error(header, ServiceError::application(PANICKED).to_string());
            }
        }
        match method.encode_replyv(self.codec_type, &replyv) {
            Ok(body) => self.send(&header, &body),
            Err(err) => self.send_error(header, err.to_string()),
        }
    }

    fn send_error(self, mut header: Header, message: String) {
        header.error = message;
        match self.codec_type.encode(INVALID_REQUEST) {
            Ok(body) => self.send(&header, &body),
            Err(err) => error!(seq = header.seq, error = %err, "encode error response failed"),
        }
    }

    fn send(self, header: &Header, body: &[u8]) {
        if let Err(err) = lock(self.sending).write(header, body) {
            error!(seq = header.seq, error = %err, "write response failed");
        }
    }
}
