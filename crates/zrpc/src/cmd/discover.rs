use zrpc::registry::discover;

use crate::cmd::{parse_duration, DiscoverArgs};
use crate::exit::{io_error, registry_error, CliError, CliResult, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_servers, OutputFormat};

pub fn run(args: DiscoverArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| CliError::new(TRANSPORT_ERROR, format!("http client: {err}")))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start runtime", err))?;
    let servers = runtime
        .block_on(discover(&client, &args.registry))
        .map_err(|err| registry_error("discover failed", err))?;

    print_servers(&args.registry, &servers, format);
    Ok(SUCCESS)
}
