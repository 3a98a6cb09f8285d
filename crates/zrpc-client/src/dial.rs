use std::sync::mpsc::{self, RecvTimeoutError};

use tracing::{debug, info};
use zrpc_codec::Options;
use zrpc_transport::{connect, Address};

use crate::client::Client;
use crate::error::{ClientError, Result};

/// Connect to `address` (`tcp@host:port`, `unix@/path`, or `host:port`) and
/// start a client.
pub fn dial(address: &str, options: Options) -> Result<Client> {
    let address: Address = address.parse()?;
    dial_address(&address, options)
}

/// Connect and handshake within `options.connect_timeout`.
///
/// The attempt runs on its own thread; if the timeout expires first the
/// attempt is abandoned and [`ClientError::ConnectTimeout`] returned. A zero
/// timeout waits as long as the connection attempt takes.
pub fn dial_address(address: &Address, options: Options) -> Result<Client> {
    let timeout = options.connect_timeout;
    if timeout.is_zero() {
        return establish(address, options);
    }

    let (tx, rx) = mpsc::channel();
    let target = address.clone();
    std::thread::spawn(move || {
        let _ = tx.send(establish(&target, options));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            debug!(%address, ?timeout, "connect timed out");
            Err(ClientError::ConnectTimeout(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => Err(ClientError::Shutdown),
    }
}

fn establish(address: &Address, options: Options) -> Result<Client> {
    let per_attempt = (!options.connect_timeout.is_zero()).then_some(options.connect_timeout);
    let stream = connect(address, per_attempt).map_err(|err| {
        if err.is_timeout() {
            ClientError::ConnectTimeout(options.connect_timeout)
        } else {
            err.into()
        }
    })?;
    let client = Client::with_stream(stream, options)?;
    info!(%address, codec = %client.options().codec_type, "connected");
    Ok(client)
}
