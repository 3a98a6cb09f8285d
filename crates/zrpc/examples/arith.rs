//! Serve Arith and call it from several threads over one connection.
//!
//! Run with: `cargo run --example arith -p zrpc`

use std::time::Duration;

use zrpc::demo::{arith_service, Args};
use zrpc::transport::{Address, RpcListener};
use zrpc::{dial, CodecType, Options, Server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = RpcListener::bind(&"tcp@127.0.0.1:0".parse::<Address>()?)?;
    let address = listener.local_address()?.to_string();

    let mut server = Server::new();
    server.register(arith_service())?;
    std::thread::spawn(move || server.accept(&listener));

    for codec in [CodecType::Binary, CodecType::Json] {
        let client = dial(&address, Options::default().with_codec(codec))?;
        std::thread::scope(|s| {
            for i in 0..5i64 {
                let client = &client;
                s.spawn(move || {
                    let args = Args { num1: i, num2: i * i };
                    match client.call::<_, i64>("Arith.Sum", &args) {
                        Ok(sum) => println!("[{codec}] {} + {} = {sum}", args.num1, args.num2),
                        Err(err) => eprintln!("[{codec}] call failed: {err}"),
                    }
                });
            }
        });

        let slow = client.call_timeout::<_, u64>(Duration::from_millis(100), "Arith.Sleep", &500u64);
        println!("[{codec}] sleep with 100ms deadline: {slow:?}");
        client.close()?;
    }

    Ok(())
}
