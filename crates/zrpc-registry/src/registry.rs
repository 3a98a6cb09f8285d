use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

/// Path the registry is served under unless configured otherwise.
pub const DEFAULT_PATH: &str = "/_zrpc_/registry";

/// How long a server stays alive after its last heartbeat.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
struct ServerItem {
    last_heartbeat: Instant,
}

/// In-memory table of announced servers.
///
/// Expiry is lazy: stale entries are evicted when the alive list is read.
#[derive(Debug)]
pub struct Registry {
    timeout: Duration,
    servers: Mutex<HashMap<String, ServerItem>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Registry {
    /// A registry whose entries expire `timeout` after their last
    /// heartbeat. A zero timeout, or one past the clock's range, keeps
    /// entries forever.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            servers: Mutex::new(HashMap::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn servers(&self) -> MutexGuard<'_, HashMap<String, ServerItem>> {
        self.servers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a heartbeat from `address`, adding it if unknown.
    pub fn heartbeat(&self, address: &str) {
        let now = Instant::now();
        let mut servers = self.servers();
        match servers.get_mut(address) {
            Some(item) => item.last_heartbeat = now,
            None => {
                info!(%address, "server registered");
                servers.insert(address.to_string(), ServerItem { last_heartbeat: now });
            }
        }
    }

    /// Addresses whose last heartbeat is still within the timeout, sorted.
    /// Expired entries are removed.
    pub fn alive_servers(&self) -> Vec<String> {
        let now = Instant::now();
        let timeout = self.timeout;
        let mut servers = self.servers();

        servers.retain(|address, item| {
            let alive = timeout.is_zero()
                || item
                    .last_heartbeat
                    .checked_add(timeout)
                    .map_or(true, |expires| expires > now);
            if !alive {
                debug!(%address, "server expired");
            }
            alive
        });

        let mut alive: Vec<String> = servers.keys().cloned().collect();
        alive.sort_unstable();
        alive
    }
}
