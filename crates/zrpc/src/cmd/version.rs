use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("zrpc {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: zrpc");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("ZRPC_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("rust_version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!(
        "codecs: {}, {}",
        zrpc::CodecType::Binary,
        zrpc::CodecType::Json
    );
    println!("magic_number: {:#x}", zrpc::codec::MAGIC_NUMBER);
    println!("registry_path: {}", zrpc::registry::DEFAULT_PATH);

    Ok(SUCCESS)
}
