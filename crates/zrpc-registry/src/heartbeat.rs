use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{RegistryError, Result};
use crate::http::{SERVERS_HEADER, SERVER_HEADER};
use crate::registry::DEFAULT_TIMEOUT;

/// Announce `address` to the registry at `registry_url` once.
pub async fn send_heartbeat(
    client: &reqwest::Client,
    registry_url: &str,
    address: &str,
) -> Result<()> {
    debug!(%address, registry = registry_url, "send heartbeat");
    let response = client
        .post(registry_url)
        .header(SERVER_HEADER, address)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(RegistryError::Status(response.status().as_u16()));
    }
    Ok(())
}

/// Fetch the alive server list from the registry at `registry_url`.
pub async fn discover(client: &reqwest::Client, registry_url: &str) -> Result<Vec<String>> {
    let response = client.get(registry_url).send().await?;
    if !response.status().is_success() {
        return Err(RegistryError::Status(response.status().as_u16()));
    }

    let servers = response
        .headers()
        .get(SERVERS_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    Ok(servers
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

/// Keep announcing `address` every `period`, starting now.
///
/// `None` picks one minute less than the default registry timeout. The task
/// stops at the first failed heartbeat and resolves to that error.
pub fn spawn_heartbeat(
    registry_url: String,
    address: String,
    period: Option<Duration>,
) -> JoinHandle<Result<()>> {
    let period = period
        .filter(|p| !p.is_zero())
        .unwrap_or(DEFAULT_TIMEOUT - Duration::from_secs(60));

    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Err(err) = send_heartbeat(&client, &registry_url, &address).await {
                warn!(%address, registry = %registry_url, error = %err, "heartbeat failed; stopping");
                return Err(err);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{spawn, RegistryConfig};
    use crate::registry::DEFAULT_PATH;

    #[tokio::test]
    async fn heartbeat_then_discover() {
        let (addr, _registry, _task) = spawn("127.0.0.1:0", RegistryConfig::default())
            .await
            .expect("registry should start");
        let url = format!("http://{addr}{DEFAULT_PATH}");
        let client = reqwest::Client::new();

        assert!(discover(&client, &url).await.expect("discover").is_empty());

        send_heartbeat(&client, &url, "tcp@127.0.0.1:9999")
            .await
            .expect("heartbeat");
        send_heartbeat(&client, &url, "tcp@127.0.0.1:1111")
            .await
            .expect("heartbeat");

        assert_eq!(
            discover(&client, &url).await.expect("discover"),
            vec!["tcp@127.0.0.1:1111", "tcp@127.0.0.1:9999"]
        );
    }

    #[tokio::test]
    async fn spawned_heartbeat_registers_immediately() {
        let (addr, registry, _task) = spawn("127.0.0.1:0", RegistryConfig::default())
            .await
            .expect("registry should start");
        let url = format!("http://{addr}{DEFAULT_PATH}");

        let beat = spawn_heartbeat(url, "tcp@127.0.0.1:4242".to_string(), None);
        for _ in 0..100 {
            if !registry.alive_servers().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(registry.alive_servers(), vec!["tcp@127.0.0.1:4242"]);
        beat.abort();
    }

    #[tokio::test]
    async fn heartbeat_to_wrong_path_fails_with_status() {
        let (addr, _registry, _task) = spawn("127.0.0.1:0", RegistryConfig::default())
            .await
            .expect("registry should start");
        let url = format!("http://{addr}/nope");

        let err = send_heartbeat(&reqwest::Client::new(), &url, "tcp@x:1")
            .await
            .expect_err("404 should fail");
        assert!(matches!(err, RegistryError::Status(404)));
    }
}
