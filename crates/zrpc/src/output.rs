use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ListeningOutput<'a> {
    event: &'static str,
    role: &'a str,
    address: &'a str,
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    service_method: &'a str,
    elapsed_ms: u128,
    reply: &'a Value,
}

#[derive(Serialize)]
struct ServersOutput<'a> {
    registry: &'a str,
    servers: &'a [String],
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Announce a bound endpoint. JSON output is one line so scripts can read
/// the actual address when binding port 0.
pub fn print_listening(role: &str, address: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ListeningOutput {
            event: "listening",
            role,
            address,
        }),
        OutputFormat::Table => {
            let mut table = table(vec!["ROLE", "ADDRESS"]);
            table.add_row(vec![role, address]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{role} listening on {address}"),
    }
}

pub fn print_reply(service_method: &str, elapsed_ms: u128, reply: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ReplyOutput {
            service_method,
            elapsed_ms,
            reply,
        }),
        OutputFormat::Table => {
            let mut table = table(vec!["METHOD", "ELAPSED", "REPLY"]);
            table.add_row(vec![
                service_method.to_string(),
                format!("{elapsed_ms}ms"),
                reply.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let rendered = serde_json::to_string_pretty(reply).unwrap_or_else(|_| reply.to_string());
            println!("{service_method} -> {rendered}");
        }
    }
}

pub fn print_servers(registry: &str, servers: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ServersOutput { registry, servers }),
        OutputFormat::Table => {
            let mut table = table(vec!["SERVER"]);
            for server in servers {
                table.add_row(vec![server.as_str()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if servers.is_empty() {
                println!("no alive servers at {registry}");
            }
            for server in servers {
                println!("{server}");
            }
        }
    }
}
