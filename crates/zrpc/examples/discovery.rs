//! Run a registry, announce two servers, and spread calls across them.
//!
//! Run with: `cargo run --example discovery -p zrpc`

use std::time::Duration;

use zrpc::demo::{arith_service, Args};
use zrpc::registry::{discover, spawn, spawn_heartbeat, RegistryConfig, DEFAULT_PATH};
use zrpc::transport::{Address, RpcListener};
use zrpc::{dial, Options, Server};

fn start_server() -> Result<String, Box<dyn std::error::Error>> {
    let listener = RpcListener::bind(&"tcp@127.0.0.1:0".parse::<Address>()?)?;
    let address = listener.local_address()?.to_string();
    let mut server = Server::new();
    server.register(arith_service())?;
    std::thread::spawn(move || server.accept(&listener));
    Ok(address)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (registry_addr, _registry, _task) =
        spawn("127.0.0.1:0", RegistryConfig::default()).await?;
    let url = format!("http://{registry_addr}{DEFAULT_PATH}");

    for _ in 0..2 {
        let address = start_server()?;
        drop(spawn_heartbeat(url.clone(), address, Some(Duration::from_secs(60))));
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    let servers = discover(&reqwest::Client::new(), &url).await?;
    println!("alive: {servers:?}");

    let replies = tokio::task::spawn_blocking(move || {
        servers
            .iter()
            .enumerate()
            .map(|(i, address)| {
                let client = dial(address, Options::default())?;
                let n = i as i64;
                let sum: i64 = client.call("Arith.Sum", &Args { num1: n, num2: 10 })?;
                Ok::<_, zrpc::ClientError>(format!("{address}: {n} + 10 = {sum}"))
            })
            .collect::<Result<Vec<_>, _>>()
    })
    .await??;

    for reply in replies {
        println!("{reply}");
    }
    Ok(())
}
