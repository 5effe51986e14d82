use super::*;
use serde_json::json;
use tokio::io::Lines;
use tokio::net::TcpListener;

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr").to_string();
    (listener, address)
}

async fn accept(listener: &TcpListener) -> (Lines<BufReader<OwnedReadHalf>>, OwnedWriteHalf) {
    let (socket, _) = listener.accept().await.expect("accept");
    let (read_half, write_half) = socket.into_split();
    (BufReader::new(read_half).lines(), write_half)
}

async fn next_request(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> Value {
    let line = lines.next_line().await.expect("read").expect("request line");
    serde_json::from_str(&line).expect("request json")
}

async fn send(write_half: &mut OwnedWriteHalf, frame: Value) {
    write_half
        .write_all(format!("{}\n", frame).as_bytes())
        .await
        .expect("write frame");
}

fn client(address: String, request_timeout_ms: u64) -> JsonBridgeClient {
    JsonBridgeClient::new(
        address,
        Duration::from_secs(1),
        Duration::from_millis(request_timeout_ms),
    )
}

#[tokio::test]
async fn test_call_receives_matching_reply_and_callbacks_flow() {
    let (listener, address) = listen().await;
    let server = tokio::spawn(async move {
        let (mut lines, mut write_half) = accept(&listener).await;
        let request = next_request(&mut lines).await;
        send(
            &mut write_half,
            json!({"method": "ManiaPlanet.PlayerConnect", "params": ["alice", false]}),
        )
        .await;
        send(&mut write_half, json!({"id": request["id"], "result": {"Name": "ManiaPlanet"}})).await;
        request
    });

    let client = client(address, 1_000);
    client.connect().await.expect("connects");
    let mut callbacks = client.take_callbacks().expect("callback stream");
    assert!(client.take_callbacks().is_none());

    let result = client.call("GetVersion", vec![]).await.expect("reply");
    assert_eq!(result, json!({"Name": "ManiaPlanet"}));

    let callback = callbacks.recv().await.expect("callback");
    assert_eq!(callback.method, "ManiaPlanet.PlayerConnect");
    assert_eq!(callback.args, vec![json!("alice"), json!(false)]);

    let request = server.await.expect("server task");
    assert_eq!(request["method"], "GetVersion");
    assert_eq!(request["params"], json!([]));
    assert_eq!(client.pending_calls(), 0);
}

#[tokio::test]
async fn test_fault_reply_becomes_remote_fault() {
    let (listener, address) = listen().await;
    let server = tokio::spawn(async move {
        let (mut lines, mut write_half) = accept(&listener).await;
        let request = next_request(&mut lines).await;
        send(
            &mut write_half,
            json!({"id": request["id"], "fault": {"code": -1000, "message": "Login unknown."}}),
        )
        .await;
        // Keep the socket open until the client is done.
        let _ = lines.next_line().await;
    });

    let client = client(address, 1_000);
    client.connect().await.expect("connects");

    let err = client
        .call("Kick", vec![json!("ghost"), json!("")])
        .await
        .expect_err("fault");
    assert!(matches!(err, RemoteError::Fault { code: -1000, ref message } if message == "Login unknown."));

    client.disconnect().await.expect("disconnects");
    server.await.expect("server task");
}

#[tokio::test]
async fn test_authentication_refusal() {
    let (listener, address) = listen().await;
    let server = tokio::spawn(async move {
        let (mut lines, mut write_half) = accept(&listener).await;
        let request = next_request(&mut lines).await;
        assert_eq!(request["method"], "Authenticate");
        assert_eq!(request["params"], json!(["SuperAdmin", "wrong"]));
        send(
            &mut write_half,
            json!({"id": request["id"], "fault": {"code": -1000, "message": "Permission denied."}}),
        )
        .await;
        let _ = lines.next_line().await;
    });

    let client = client(address, 1_000);
    client.connect().await.expect("connects");

    let err = client
        .authenticate("SuperAdmin", "wrong")
        .await
        .expect_err("refused");
    assert!(matches!(err, RemoteError::Authentication(ref message) if message == "Permission denied."));

    client.disconnect().await.expect("disconnects");
    server.await.expect("server task");
}

#[tokio::test]
async fn test_reply_arrives_behind_undrained_callback_burst() {
    let burst = CALLBACK_BUFFER + 10;
    let (listener, address) = listen().await;
    let server = tokio::spawn(async move {
        let (mut lines, mut write_half) = accept(&listener).await;
        let request = next_request(&mut lines).await;
        for index in 0..burst {
            send(
                &mut write_half,
                json!({"method": "ManiaPlanet.PlayerChat", "params": [1, "alice", index.to_string(), false]}),
            )
            .await;
        }
        send(&mut write_half, json!({"id": request["id"], "result": "3.3.0"})).await;
        (lines, write_half)
    });

    let client = client(address, 1_000);
    client.connect().await.expect("connects");
    let mut callbacks = client.take_callbacks().expect("callback stream");

    let result = client.call("GetVersion", vec![]).await.expect("reply despite backlog");
    assert_eq!(result, json!("3.3.0"));

    for index in 0..burst {
        let callback = callbacks.recv().await.expect("queued callback");
        assert_eq!(callback.args[2], json!(index.to_string()));
    }

    let _connection = server.await.expect("server task");
}

#[tokio::test]
async fn test_connection_loss_fails_pending_calls_and_ends_callbacks() {
    let (listener, address) = listen().await;
    let server = tokio::spawn(async move {
        let (mut lines, write_half) = accept(&listener).await;
        let _ = next_request(&mut lines).await;
        drop(write_half);
        drop(lines);
    });

    let client = client(address, 5_000);
    client.connect().await.expect("connects");
    let mut callbacks = client.take_callbacks().expect("callback stream");

    let err = client.call("GetStatus", vec![]).await.expect_err("closed");
    assert!(matches!(err, RemoteError::Closed));
    assert!(callbacks.recv().await.is_none());
    assert_eq!(client.pending_calls(), 0);

    server.await.expect("server task");
}

#[tokio::test]
async fn test_unanswered_call_times_out() {
    let (listener, address) = listen().await;
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let (mut lines, _write_half) = accept(&listener).await;
        let _ = next_request(&mut lines).await;
        let _ = release_rx.await;
    });

    let client = client(address, 50);
    client.connect().await.expect("connects");

    let err = client.call("GetStatus", vec![]).await.expect_err("timeout");
    assert!(matches!(err, RemoteError::Connection(ref message) if message.contains("timed out")));
    assert_eq!(client.pending_calls(), 0);

    let _ = release_tx.send(());
    server.await.expect("server task");
}

#[tokio::test]
async fn test_call_before_connect_is_closed() {
    let client = client("127.0.0.1:1".to_string(), 50);
    let err = client.call("GetStatus", vec![]).await.expect_err("not connected");
    assert!(matches!(err, RemoteError::Closed));
    assert!(client.take_callbacks().is_none());
    assert_eq!(client.pending_calls(), 0);
}

#[test]
fn test_from_config_uses_address() {
    let config = ServerConfig {
        host: "10.0.0.5".to_string(),
        port: 5005,
        ..ServerConfig::default()
    };
    let client = JsonBridgeClient::from_config(&config);
    assert_eq!(client.address(), "10.0.0.5:5005");
}
