use std::sync::mpsc;
use std::time::{Duration, Instant};

use zrpc::demo::{arith_service, Args};
use zrpc::transport::{Address, RpcListener};
use zrpc::{dial, Client, CodecType, ErrorKind, Options, Server};

/// Serve the Arith service on `address` in the background and return the
/// bound address in dialable form.
fn start_server(address: &str) -> String {
    let address: Address = address.parse().expect("address should parse");
    let listener = RpcListener::bind(&address).expect("bind should succeed");
    let local = listener.local_address().expect("local address").to_string();

    let mut server = Server::new();
    server.register(arith_service()).expect("register");
    std::thread::spawn(move || server.accept(&listener));
    local
}

fn connect(address: &str, options: Options) -> Client {
    dial(address, options.with_connect_timeout(Duration::from_secs(2))).expect("dial")
}

#[test]
fn concurrent_calls_share_one_connection() {
    let address = start_server("tcp@127.0.0.1:0");
    let client = connect(&address, Options::default());

    std::thread::scope(|s| {
        for i in 0..16i64 {
            let client = &client;
            s.spawn(move || {
                let sum: i64 = client
                    .call("Arith.Sum", &Args { num1: i, num2: i * i })
                    .expect("sum");
                assert_eq!(sum, i + i * i);
            });
        }
    });

    assert_eq!(client.pending_len(), 0);
    client.close().expect("close");
}

#[test]
fn responses_arrive_out_of_order() {
    let address = start_server("tcp@127.0.0.1:0");
    let client = connect(&address, Options::default());

    let slow = client.async_call::<_, u64>("Arith.Sleep", &200u64);
    let fast = client.async_call::<_, i64>("Arith.Mul", &Args { num1: 6, num2: 7 });
    assert!(fast.seq() > slow.seq());

    assert_eq!(fast.wait().into_result().expect("mul"), 42);
    assert!(client.is_pending(slow.seq()));
    assert_eq!(slow.wait().into_result().expect("sleep"), 200);
}

#[test]
fn async_call_with_delivers_on_shared_channel() {
    let address = start_server("tcp@127.0.0.1:0");
    let client = connect(&address, Options::default());

    let (tx, rx) = mpsc::channel();
    let mut seqs = Vec::new();
    for n in 1..=3i64 {
        seqs.push(client.async_call_with("Arith.Sum", &Args { num1: n, num2: 0 }, tx.clone()));
    }

    let mut done: Vec<_> = (0..3)
        .map(|_| rx.recv_timeout(Duration::from_secs(2)).expect("completion"))
        .map(|call| (call.seq, call.into_result().expect("sum")))
        .collect();
    done.sort();
    assert_eq!(done, vec![(seqs[0], 1), (seqs[1], 2), (seqs[2], 3)]);
}

#[test]
fn call_timeout_abandons_only_that_call() {
    let address = start_server("tcp@127.0.0.1:0");
    let client = connect(&address, Options::default());

    let started = Instant::now();
    let err = client
        .call_timeout::<_, u64>(Duration::from_millis(50), "Arith.Sleep", &1_000u64)
        .expect_err("should time out");
    assert_eq!(err.kind(), ErrorKind::CallTimeout);
    assert!(started.elapsed() < Duration::from_millis(900));

    // The late reply is dropped and the connection keeps working.
    let sum: i64 = client
        .call("Arith.Sum", &Args { num1: 2, num2: 3 })
        .expect("sum after timeout");
    assert_eq!(sum, 5);
    assert!(client.is_available());
}

#[test]
fn handle_timeout_is_reported_by_server() {
    let address = start_server("tcp@127.0.0.1:0");
    let client = connect(
        &address,
        Options::default().with_handle_timeout(Duration::from_millis(50)),
    );

    let err = client
        .call::<_, u64>("Arith.Sleep", &500u64)
        .expect_err("server should give up");
    assert_eq!(err.kind(), ErrorKind::HandleTimeout);
    assert!(err.to_string().contains("handle timeout"));

    let product: i64 = client
        .call("Arith.Mul", &Args { num1: 3, num2: 4 })
        .expect("mul after handle timeout");
    assert_eq!(product, 12);
}

#[test]
fn dispatch_errors_come_back_per_call() {
    let address = start_server("tcp@127.0.0.1:0");
    let client = connect(&address, Options::default());

    let cases = [
        ("Nope.Sum", ErrorKind::NotFoundService),
        ("Arith.Div", ErrorKind::NotFoundMethod),
        ("ArithSum", ErrorKind::MalformedName),
    ];
    for (name, kind) in cases {
        let err = client
            .call::<_, i64>(name, &Args::default())
            .expect_err(name);
        assert_eq!(err.kind(), kind, "{name}: {err}");
    }

    let err = client
        .call::<_, i64>("Arith.Sum", &Args { num1: i64::MAX, num2: 1 })
        .expect_err("overflow");
    assert_eq!(err.kind(), ErrorKind::Application);
    assert_eq!(err.to_string(), "integer overflow");

    assert!(client.is_available());
}

#[cfg(unix)]
#[test]
fn json_codec_over_unix_socket() {
    let dir = std::env::temp_dir().join(format!("zrpc-e2e-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("arith.sock");

    let address = start_server(&format!("unix@{}", path.display()));
    let client = connect(&address, Options::default().with_codec(CodecType::Json));
    assert_eq!(client.options().codec_type, CodecType::Json);

    let sum: i64 = client
        .call("Arith.Sum", &Args { num1: 40, num2: 2 })
        .expect("sum");
    assert_eq!(sum, 42);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn closed_client_rejects_calls() {
    let address = start_server("tcp@127.0.0.1:0");
    let client = connect(&address, Options::default());

    client.close().expect("first close");
    assert_eq!(
        client.close().expect_err("second close").kind(),
        ErrorKind::Shutdown
    );
    assert!(!client.is_available());

    let err = client
        .call::<_, i64>("Arith.Sum", &Args::default())
        .expect_err("closed");
    assert_eq!(err.kind(), ErrorKind::Shutdown);
}

#[cfg(feature = "registry")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn discovered_server_answers_calls() {
    use zrpc::registry::{discover, spawn, spawn_heartbeat, RegistryConfig, DEFAULT_PATH};

    let (registry_addr, _registry, _task) = spawn("127.0.0.1:0", RegistryConfig::default())
        .await
        .expect("registry");
    let url = format!("http://{registry_addr}{DEFAULT_PATH}");

    let address = start_server("tcp@127.0.0.1:0");
    let _heartbeat = spawn_heartbeat(url.clone(), address.clone(), Some(Duration::from_secs(60)));

    let http = reqwest::Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    let servers = loop {
        let servers = discover(&http, &url).await.expect("discover");
        if !servers.is_empty() || Instant::now() > deadline {
            break servers;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    };
    assert_eq!(servers, vec![address.clone()]);

    let sum = tokio::task::spawn_blocking(move || {
        let client = connect(&servers[0], Options::default());
        client.call::<_, i64>("Arith.Sum", &Args { num1: 1, num2: 1 })
    })
    .await
    .expect("join")
    .expect("sum");
    assert_eq!(sum, 2);
}
