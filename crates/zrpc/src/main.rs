mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "zrpc", version, about = "Serve, call, and discover zrpc services")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_call_subcommand() {
        let cli = Cli::try_parse_from([
            "zrpc",
            "call",
            "tcp@127.0.0.1:9999",
            "Arith.Sum",
            "--json",
            "{\"num1\":1,\"num2\":2}",
            "--timeout",
            "2s",
        ])
        .expect("call args should parse");

        match cli.command {
            Command::Call(args) => {
                assert_eq!(args.service_method, "Arith.Sum");
                assert_eq!(args.timeout, "2s");
                assert!(args.handle_timeout.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn advertise_requires_registry() {
        let err = Cli::try_parse_from([
            "zrpc",
            "serve",
            "tcp@127.0.0.1:0",
            "--advertise",
            "tcp@10.0.0.1:9999",
        ])
        .expect_err("advertise without registry should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn registry_defaults() {
        let cli = Cli::try_parse_from(["zrpc", "registry"]).expect("registry should parse");
        match cli.command {
            Command::Registry(args) => {
                assert_eq!(args.address, "127.0.0.1:9999");
                assert_eq!(args.path, zrpc::registry::DEFAULT_PATH);
                assert_eq!(args.timeout, "5m");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["zrpc", "discover", "http://x/r", "--format", "pretty"])
            .expect("global flag should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Pretty)));
    }
}
