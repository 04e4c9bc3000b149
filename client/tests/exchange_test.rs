use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;

use client::exchange::{
    binding_check, open_socket, resolve_target, run_exchange, run_exchange_blocking,
    send_request, ExchangeConfig, ExchangeError, Exchanger,
};
use server::server::Server;
use stun_rfc3489::header::{MessageType, StunHeader, TransId};
use stun_rfc3489::util::generate_transaction_id;

const GUARD: Duration = Duration::from_secs(5);

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

async fn start_responder() -> (SocketAddr, watch::Sender<u8>) {
    let (signal_tx, signal_rx) = watch::channel(0_u8);
    let server = Server::new(loopback(), signal_rx).await.unwrap();
    let addr = server.local_addr();
    tokio::spawn(async move {
        server.run().await;
    });
    (addr, signal_tx)
}

// 收到一个请求后, 用 reply 构造的数据回复
async fn start_peer<F>(reply: F) -> SocketAddr
where
    F: FnOnce(&[u8]) -> Vec<u8> + Send + 'static,
{
    let sock = UdpSocket::bind(loopback()).await.unwrap();
    let addr = sock.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = vec![0u8; 1024];
        let (len, remote_addr) = sock.recv_from(&mut buf).await.unwrap();
        let data = reply(&buf[..len]);
        sock.send_to(&data, remote_addr).await.unwrap();
    });
    addr
}

fn config_for(addr: SocketAddr) -> ExchangeConfig {
    ExchangeConfig::new(&addr.ip().to_string(), addr.port()).local_addr(loopback())
}

#[tokio::test]
async fn test_happy_path() {
    let (addr, signal_tx) = start_responder().await;
    let exchanger = Exchanger::new(config_for(addr));

    let sock = open_socket(loopback()).await.unwrap();
    let target = resolve_target("127.0.0.1", addr.port()).unwrap();
    let request = send_request(&sock, target).await.unwrap();
    assert_eq!(request.msg_type, MessageType::BindingRequest);
    assert_eq!(request.msg_len, 0);

    let response = tokio::time::timeout(GUARD, exchanger.receive_response(&sock, target))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.msg_type, MessageType::BindingResponse);
    assert_eq!(response.msg_len, 0);
    assert_eq!(response.trans_id, request.trans_id);

    signal_tx.send(1).unwrap();
}

#[tokio::test]
async fn test_run_with_check() {
    let (addr, signal_tx) = start_responder().await;
    let exchanger = Exchanger::new(config_for(addr).check_trans_id(true));

    let response = tokio::time::timeout(GUARD, exchanger.run())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.msg_type, MessageType::BindingResponse);

    signal_tx.send(1).unwrap();
}

#[tokio::test]
async fn test_bad_address() {
    let err = run_exchange("not-an-ip", 19302).await.unwrap_err();
    assert!(matches!(err, ExchangeError::AddressParse(_)));
    assert_eq!(err.stage(), "address parsing");
}

#[tokio::test]
async fn test_no_response_blocks() {
    let silent = UdpSocket::bind(loopback()).await.unwrap();
    let exchanger = Exchanger::new(config_for(silent.local_addr().unwrap()));

    let res = tokio::time::timeout(Duration::from_millis(300), exchanger.run()).await;
    assert!(res.is_err(), "exchange should still be pending");
}

#[tokio::test]
async fn test_no_response_timeout() {
    let silent = UdpSocket::bind(loopback()).await.unwrap();
    let timeout = Duration::from_millis(100);
    let exchanger = Exchanger::new(config_for(silent.local_addr().unwrap()).timeout(Some(timeout)));

    let err = tokio::time::timeout(GUARD, exchanger.run())
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, ExchangeError::Timeout(d) if d == timeout));
}

#[tokio::test]
async fn test_cancel_pending_receive() {
    let silent = UdpSocket::bind(loopback()).await.unwrap();
    let exchanger = Exchanger::new(config_for(silent.local_addr().unwrap()));
    let canceller = exchanger.canceller();

    let handle = tokio::spawn(async move { exchanger.run().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    canceller.cancel();

    let err = tokio::time::timeout(GUARD, handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, ExchangeError::ReceiveFailed(ref e) if e == "cancelled"));
}

#[tokio::test]
async fn test_truncated_response() {
    let addr = start_peer(|_| vec![0x01; 10]).await;
    let exchanger = Exchanger::new(config_for(addr));

    let err = tokio::time::timeout(GUARD, exchanger.run())
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, ExchangeError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_unknown_type_response() {
    let addr = start_peer(|req| {
        let req = StunHeader::decode(req).unwrap();
        StunHeader::new(MessageType::Unknown(0x9999), 0, req.trans_id)
            .encode()
            .to_vec()
    })
    .await;
    let exchanger = Exchanger::new(config_for(addr));

    let response = tokio::time::timeout(GUARD, exchanger.run())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.msg_type, MessageType::Unknown(0x9999));
}

#[tokio::test]
async fn test_mismatched_transaction() {
    let reply = |_: &[u8]| {
        StunHeader::new(MessageType::BindingResponse, 0, generate_transaction_id())
            .encode()
            .to_vec()
    };

    // 默认只打印 warn
    let addr = start_peer(reply).await;
    let response = tokio::time::timeout(GUARD, Exchanger::new(config_for(addr)).run())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.msg_type, MessageType::BindingResponse);

    let addr = start_peer(reply).await;
    let exchanger = Exchanger::new(config_for(addr).check_trans_id(true));
    let err = tokio::time::timeout(GUARD, exchanger.run())
        .await
        .unwrap()
        .unwrap_err();
    match err {
        ExchangeError::MismatchedTransaction { sent, received } => {
            assert_ne!(sent, received);
            assert_ne!(sent, TransId::default());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_blocking_entry_point() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (addr, signal_tx) = rt.block_on(start_responder());

    let response = run_exchange_blocking(config_for(addr)).unwrap();
    assert_eq!(response.msg_type, MessageType::BindingResponse);

    let outcome = binding_check("127.0.0.1", addr.port());
    assert!(outcome.is_success(), "{}", outcome.message());
    assert!(outcome.message().contains("Binding Response"));

    signal_tx.send(1).unwrap();
}

#[tokio::test]
async fn test_socket_creation_failure() {
    // TEST-NET-3, 本机没有这个地址
    let local: SocketAddr = "203.0.113.7:0".parse().unwrap();
    let exchanger = Exchanger::new(ExchangeConfig::new("127.0.0.1", 19302).local_addr(local));

    let err = tokio::time::timeout(GUARD, exchanger.run())
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, ExchangeError::SocketCreation(_)), "{:?}", err);
    assert_eq!(err.stage(), "socket creation");
    assert!(err.to_string().starts_with("socket creation failed"));
}

#[tokio::test]
async fn test_binding_check_inside_runtime() {
    let outcome = binding_check("not-an-ip", 19302);
    assert!(!outcome.is_success());
    assert!(outcome.message().starts_with("address parse failed"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_binding_check_inside_runtime_success() {
    let (addr, signal_tx) = start_responder().await;

    let outcome = binding_check("127.0.0.1", addr.port());
    assert!(outcome.is_success(), "{}", outcome.message());
    assert!(outcome.message().contains("Binding Response"));

    signal_tx.send(1).unwrap();
}
