use std::time::Instant;

use serde_json::Value;
use tracing::debug;
use zrpc::{dial, CodecType, Options};

use crate::cmd::{parse_duration, parse_timeout, CallArgs};
use crate::exit::{client_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_reply, OutputFormat};

/// Call over the JSON codec. Arguments and replies are arbitrary JSON, which
/// only a self-describing codec can carry without knowing the method's types.
pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let argument: Value = serde_json::from_str(&args.json)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid --json argument: {err}")))?;

    let mut options = Options::default()
        .with_codec(CodecType::Json)
        .with_connect_timeout(parse_timeout(&args.connect_timeout)?);
    if let Some(handle_timeout) = &args.handle_timeout {
        options = options.with_handle_timeout(parse_duration(handle_timeout)?);
    }
    let timeout = parse_timeout(&args.timeout)?;

    let client = dial(&args.address, options).map_err(|err| client_error("dial failed", err))?;

    let started = Instant::now();
    let reply: Value = client
        .call_timeout(timeout, &args.service_method, &argument)
        .map_err(|err| client_error("call failed", err))?;
    let elapsed = started.elapsed();
    debug!(service_method = %args.service_method, ?elapsed, "call complete");

    let _ = client.close();
    print_reply(&args.service_method, elapsed.as_millis(), &reply, format);
    Ok(SUCCESS)
}
