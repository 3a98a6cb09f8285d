use std::time::Duration;

use clap::{Args, Subcommand};
use zrpc::registry::DEFAULT_PATH;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod call;
pub mod discover;
pub mod registry;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the built-in Arith service.
    Serve(ServeArgs),
    /// Call one method and print the reply.
    Call(CallArgs),
    /// Run a heartbeat discovery registry.
    Registry(RegistryArgs),
    /// List the servers a registry considers alive.
    Discover(DiscoverArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Call(args) => call::run(args, format),
        Command::Registry(args) => registry::run(args, format),
        Command::Discover(args) => discover::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind: tcp@host:port, unix@/path, or host:port.
    pub address: String,
    /// Registry URL to send heartbeats to.
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,
    /// Address announced to the registry. Default: the bound address.
    #[arg(long, value_name = "ADDRESS", requires = "registry")]
    pub advertise: Option<String>,
    /// Heartbeat period (e.g. 30s, 4m). Default: 4m.
    #[arg(long, requires = "registry")]
    pub heartbeat_period: Option<String>,
    /// How long a new connection may take to handshake.
    #[arg(long, default_value = "5s")]
    pub handshake_timeout: String,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Server address: tcp@host:port, unix@/path, or host:port.
    pub address: String,
    /// Method to call, as Service.Method.
    pub service_method: String,
    /// JSON argument.
    #[arg(long, default_value = "null")]
    pub json: String,
    /// Connect plus handshake timeout.
    #[arg(long, default_value = "10s")]
    pub connect_timeout: String,
    /// Time allowed for the reply; 0 waits forever.
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Ask the server to give up on the method after this long.
    #[arg(long)]
    pub handle_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct RegistryArgs {
    /// Address to bind (host:port).
    #[arg(default_value = "127.0.0.1:9999")]
    pub address: String,
    /// HTTP path the registry answers on.
    #[arg(long, default_value = DEFAULT_PATH, value_parser = parse_http_path)]
    pub path: String,
    /// Servers silent for longer than this are dropped; 0 keeps them forever.
    #[arg(long, default_value = "5m")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Registry URL, e.g. http://127.0.0.1:9999/_zrpc_/registry.
    pub registry: String,
    /// Request timeout.
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Registry paths must be absolute so they can be mounted as a route.
fn parse_http_path(input: &str) -> Result<String, String> {
    if input.starts_with('/') {
        Ok(input.to_string())
    } else {
        Err(format!("path must start with '/': {input}"))
    }
}

/// Parse `150ms`, `5s`, `4m`, or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let duration = parse_timeout(input)?;
    if duration.is_zero() {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }
    Ok(duration)
}

/// Like [`parse_duration`], but `0` is accepted and means "no limit".
pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, scale): (&str, fn(u64) -> Duration) = if let Some(num) = input.strip_suffix("ms")
    {
        (num, Duration::from_millis)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, Duration::from_secs)
    } else if let Some(num) = input.strip_suffix('m') {
        (num, |m| Duration::from_secs(m.saturating_mul(60)))
    } else {
        (input, Duration::from_secs)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    Ok(scale(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("4m").unwrap(), Duration::from_secs(240));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn parse_timeout_allows_zero() {
        assert_eq!(parse_timeout("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_timeout("0ms").unwrap(), Duration::ZERO);
    }

    #[test]
    fn registry_path_must_be_absolute() {
        assert_eq!(parse_http_path("/rpc").unwrap(), "/rpc");
        assert!(parse_http_path("rpc").is_err());
    }
}
