use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::info;
use zrpc::demo::arith_service;
use zrpc::registry::spawn_heartbeat;
use zrpc::transport::{Address, RpcListener};
use zrpc::{Server, ServerConfig};

use crate::cmd::{parse_duration, parse_timeout, ServeArgs};
use crate::exit::{io_error, server_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_listening, OutputFormat};

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let address: Address = args
        .address
        .parse()
        .map_err(|err| transport_error("invalid address", err))?;
    let handshake_timeout = parse_timeout(&args.handshake_timeout)?;
    let heartbeat = args.heartbeat_period.as_deref().map(parse_duration).transpose()?;

    let mut server = Server::with_config(ServerConfig {
        handshake_timeout,
        ..ServerConfig::default()
    });
    server
        .register(arith_service())
        .map_err(|err| server_error("register failed", err))?;

    let listener =
        RpcListener::bind(&address).map_err(|err| transport_error("bind failed", err))?;
    let local = listener
        .local_address()
        .map_err(|err| transport_error("bind failed", err))?;
    install_interrupt_handler(&local)?;

    // Held for the lifetime of the accept loop; dropping it stops heartbeats.
    let _runtime = match args.registry {
        Some(url) => {
            let advertised = args.advertise.unwrap_or_else(|| local.to_string());
            Some(start_heartbeat(url, advertised, heartbeat)?)
        }
        None => None,
    };

    print_listening("server", &local.to_string(), format);
    info!(address = %local, services = ?server.services().names(), "serving");

    server
        .accept(&listener)
        .map_err(|err| server_error("accept failed", err))?;
    Ok(SUCCESS)
}

fn start_heartbeat(url: String, address: String, period: Option<Duration>) -> CliResult<Runtime> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("zrpc-heartbeat")
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start heartbeat runtime", err))?;

    info!(registry = %url, %address, "sending heartbeats");
    let _guard = runtime.enter();
    drop(spawn_heartbeat(url, address, period));
    Ok(runtime)
}

fn install_interrupt_handler(local: &Address) -> CliResult<()> {
    let socket = match local {
        Address::Unix(path) => Some(path.clone()),
        Address::Tcp(_) => None,
    };
    ctrlc::set_handler(move || {
        if let Some(path) = &socket {
            let _ = std::fs::remove_file(path);
        }
        std::process::exit(SUCCESS);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("failed to install signal handler: {err}")))
}
