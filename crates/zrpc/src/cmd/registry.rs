use tracing::info;
use zrpc::registry::{spawn, RegistryConfig};

use crate::cmd::{parse_timeout, RegistryArgs};
use crate::exit::{io_error, registry_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_listening, OutputFormat};

pub fn run(args: RegistryArgs, format: OutputFormat) -> CliResult<i32> {
    let config = RegistryConfig {
        timeout: parse_timeout(&args.timeout)?,
        path: args.path,
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("zrpc-registry")
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start runtime", err))?;

    runtime.block_on(async move {
        let path = config.path.clone();
        let (local, _registry, task) = spawn(&args.address, config)
            .await
            .map_err(|err| registry_error("registry failed to start", err))?;
        print_listening("registry", &format!("http://{local}{path}"), format);

        tokio::select! {
            joined = task => match joined {
                Ok(Ok(())) => Ok(SUCCESS),
                Ok(Err(err)) => Err(registry_error("registry stopped", err)),
                Err(err) => Err(CliError::new(INTERNAL, format!("registry task failed: {err}"))),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted; shutting down registry");
                Ok(SUCCESS)
            }
        }
    })
}
