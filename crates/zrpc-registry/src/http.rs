use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{RegistryError, Result};
use crate::registry::{Registry, DEFAULT_PATH, DEFAULT_TIMEOUT};

/// Response header listing alive servers, comma separated.
pub const SERVERS_HEADER: &str = "X-Zrpc-Servers";
/// Request header naming the server a heartbeat is for.
pub const SERVER_HEADER: &str = "X-Zrpc-Server";

/// Where and how a registry endpoint runs.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub path: String,
    /// Zero keeps servers forever.
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Routes for `registry` at `path`. Methods other than GET and POST get a
/// 405.
pub fn router(registry: Arc<Registry>, path: &str) -> Router {
    Router::new()
        .route(path, get(list_servers).post(record_heartbeat))
        .with_state(registry)
}

async fn list_servers(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let servers = registry.alive_servers().join(",");
    [(SERVERS_HEADER, servers)]
}

async fn record_heartbeat(
    State(registry): State<Arc<Registry>>,
    headers: HeaderMap,
) -> StatusCode {
    let address = headers
        .get(SERVER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match address {
        Some(address) => {
            registry.heartbeat(address);
            StatusCode::OK
        }
        None => {
            warn!("heartbeat without {SERVER_HEADER} header");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Serve `registry` on an already bound listener until the server fails.
pub async fn serve(listener: TcpListener, registry: Arc<Registry>, path: &str) -> Result<()> {
    let app = router(registry, path);
    axum::serve(listener, app)
        .await
        .map_err(RegistryError::Serve)
}

/// Bind `address` and serve a fresh registry in the background.
///
/// Returns the bound address (useful with port 0), the registry, and the
/// server task.
pub async fn spawn(
    address: &str,
    config: RegistryConfig,
) -> Result<(SocketAddr, Arc<Registry>, JoinHandle<Result<()>>)> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| RegistryError::Bind {
            address: address.to_string(),
            source,
        })?;
    let local = listener.local_addr().map_err(|source| RegistryError::Bind {
        address: address.to_string(),
        source,
    })?;

    let registry = Arc::new(Registry::new(config.timeout));
    info!(address = %local, path = %config.path, timeout = ?config.timeout, "registry listening");

    let served = Arc::clone(&registry);
    let task = tokio::spawn(async move { serve(listener, served, &config.path).await });

    Ok((local, registry, task))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn start() -> (String, Arc<Registry>) {
        let (addr, registry, _task) = spawn("127.0.0.1:0", RegistryConfig::default())
            .await
            .expect("registry should start");
        (format!("http://{addr}{DEFAULT_PATH}"), registry)
    }

    #[tokio::test]
    async fn get_lists_alive_servers_in_header() {
        let (url, registry) = start().await;
        registry.heartbeat("tcp@127.0.0.1:2");
        registry.heartbeat("tcp@127.0.0.1:1");

        let response = reqwest::Client::new()
            .get(&url)
            .send()
            .await
            .expect("GET should succeed");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let header = response
            .headers()
            .get(SERVERS_HEADER)
            .and_then(|v| v.to_str().ok())
            .expect("servers header")
            .to_string();
        assert_eq!(header, "tcp@127.0.0.1:1,tcp@127.0.0.1:2");
    }

    #[tokio::test]
    async fn post_records_heartbeat() {
        let (url, registry) = start().await;

        let response = reqwest::Client::new()
            .post(&url)
            .header(SERVER_HEADER, "tcp@127.0.0.1:7")
            .send()
            .await
            .expect("POST should succeed");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(registry.alive_servers(), vec!["tcp@127.0.0.1:7"]);
    }

    #[tokio::test]
    async fn post_without_address_is_500() {
        let (url, registry) = start().await;

        let response = reqwest::Client::new()
            .post(&url)
            .send()
            .await
            .expect("POST should complete");
        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(registry.alive_servers().is_empty());
    }

    #[tokio::test]
    async fn other_methods_are_405() {
        let (url, _registry) = start().await;
        let client = reqwest::Client::new();

        for response in [
            client.put(&url).send().await,
            client.delete(&url).send().await,
        ] {
            let response = response.expect("request should complete");
            assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let (url, _registry) = start().await;
        let url = url.replace(DEFAULT_PATH, "/elsewhere");
        let response = reqwest::Client::new()
            .get(&url)
            .send()
            .await
            .expect("request should complete");
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
