use std::io::BufReader;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use zrpc_codec::{new_codec, read_options, FrameConfig, DEFAULT_MAX_PAYLOAD, MAX_HANDSHAKE_LEN};
use zrpc_service::{Service, ServiceMap};
use zrpc_transport::{RpcListener, RpcStream};

use crate::conn::serve_codec;
use crate::error::Result;

/// Server-side limits. Per-connection behaviour such as the handling
/// timeout comes from the client's handshake instead.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// How long a new connection may take to send its handshake line.
    /// Zero waits forever. Default: 5 s.
    pub handshake_timeout: Duration,
    /// Largest header or body accepted. Default: 16 MiB.
    pub max_frame_payload: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(5),
            max_frame_payload: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Serves registered services over any number of connections.
#[derive(Debug, Default)]
pub struct Server {
    services: ServiceMap,
    config: ServerConfig,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            services: ServiceMap::new(),
            config,
        }
    }

    /// Publish a service. Fails if its name is taken.
    pub fn register(&mut self, service: Service) -> Result<()> {
        self.services.register(service)?;
        Ok(())
    }

    pub fn services(&self) -> &ServiceMap {
        &self.services
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept connections until the listener fails, serving each on its own
    /// thread. Connections still open when accepting fails are served to
    /// completion before this returns.
    pub fn accept(&self, listener: &RpcListener) -> Result<()> {
        std::thread::scope(|s| loop {
            match listener.accept() {
                Ok(stream) => {
                    s.spawn(move || self.serve_conn(stream));
                }
                Err(err) => {
                    error!(error = %err, "accept failed");
                    return Err(err.into());
                }
            }
        })
    }

    /// Serve one connection until the peer goes away.
    ///
    /// A bad handshake (wrong magic number, unknown codec, malformed line)
    /// closes the connection without writing anything back.
    pub fn serve_conn(&self, stream: RpcStream) {
        let peer = stream.peer_label();
        info!(%peer, "connection accepted");

        let handshake_timeout =
            (!self.config.handshake_timeout.is_zero()).then_some(self.config.handshake_timeout);
        if let Err(err) = stream.set_read_timeout(handshake_timeout) {
            warn!(%peer, error = %err, "could not arm handshake timeout");
        }

        let mut reader = BufReader::new(stream);
        let options = match read_options(&mut reader, MAX_HANDSHAKE_LEN) {
            Ok(options) => options,
            Err(err) => {
                warn!(%peer, error = %err, "handshake rejected");
                let _ = reader.get_ref().shutdown();
                return;
            }
        };
        if let Err(err) = reader.get_ref().set_read_timeout(None) {
            warn!(%peer, error = %err, "could not clear handshake timeout");
            let _ = reader.get_ref().shutdown();
            return;
        }

        let frames = FrameConfig {
            max_payload_size: self.config.max_frame_payload,
        };
        let codec = match new_codec(options.codec_type, reader, frames) {
            Ok(codec) => codec,
            Err(err) => {
                error!(%peer, error = %err, "codec setup failed");
                return;
            }
        };
        debug!(
            %peer,
            codec = %options.codec_type,
            handle_timeout = ?options.handle_timeout,
            "handshake accepted"
        );

        serve_codec(&self.services, codec, options.handle_timeout, &peer);
        info!(%peer, "connection closed");
    }
}
