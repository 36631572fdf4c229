//! Failure injection tests: startup failures and per-connection isolation.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use mediator_server::lifecycle::{self, Shutdown, StartupError};
use mediator_server::net::{ListenerError, TlsError};
use mediator_server::Transport;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

#[tokio::test]
async fn test_http_port_in_use_is_fatal_and_attributed() {
    let cert = common::TestCert::generate();
    let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let taken = blocker.local_addr().unwrap().port();

    let mut config = common::test_config(&cert);
    config.ports.http = taken;

    let shutdown = Shutdown::new();
    let err = lifecycle::start(config, &shutdown).await.err().expect("bind should fail");

    match &err {
        StartupError::Listener(ListenerError::Bind { transport, addr, .. }) => {
            assert_eq!(*transport, Transport::Http);
            assert_eq!(addr, &format!("127.0.0.1:{}", taken));
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("http"), "{}", message);
    assert!(message.contains(&taken.to_string()), "{}", message);
}

#[tokio::test]
async fn test_failed_startup_leaves_nothing_bound() {
    let cert = common::TestCert::generate();
    let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let taken = blocker.local_addr().unwrap().port();
    let http_port = common::free_port();
    let tcp_port = common::free_port();

    // TLS binds last, so HTTP, HTTPS and TCP are already bound when it fails.
    let mut config = common::test_config(&cert);
    config.ports.http = http_port;
    config.ports.tcp = tcp_port;
    config.ports.tls = taken;

    let shutdown = Shutdown::new();
    let err = lifecycle::start(config, &shutdown).await.err().expect("bind should fail");
    assert!(matches!(
        err,
        StartupError::Listener(ListenerError::Bind { transport: Transport::Tls, .. })
    ));

    std::net::TcpListener::bind(("127.0.0.1", http_port)).expect("HTTP port still held");
    std::net::TcpListener::bind(("127.0.0.1", tcp_port)).expect("TCP port still held");
}

#[tokio::test]
async fn test_missing_tls_material_is_fatal_before_binding() {
    let cert = common::TestCert::generate();
    let http_port = common::free_port();

    let mut config = common::test_config(&cert);
    config.ports.http = http_port;
    config.tls.key_path = cert.dir.join("missing-key.pem").to_string_lossy().into_owned();

    let shutdown = Shutdown::new();
    let err = lifecycle::start(config, &shutdown).await.err().expect("TLS load should fail");
    assert!(matches!(err, StartupError::Tls(TlsError::KeyNotFound(_))));

    std::net::TcpListener::bind(("127.0.0.1", http_port)).expect("HTTP port was bound");
}

#[tokio::test]
async fn test_idle_tcp_connection_is_closed_without_ack() {
    let cert = common::TestCert::generate();
    let mut config = common::test_config(&cert);
    config.timeouts.read_secs = 1;
    let (server, shutdown) = common::start_server(config).await;
    let addr = server.local_addr(Transport::Tcp).unwrap();

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"abc").await.unwrap();

    let mut reply = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut reply))
        .await
        .expect("server never closed the idle connection");

    // Either a clean EOF or a reset; never an acknowledgment.
    if read.is_ok() {
        assert!(reply.is_empty(), "unexpected reply: {:?}", reply);
    }

    // The listener keeps serving.
    let reply = common::tcp_exchange(addr, b"after").await;
    assert_eq!(reply, "{\"status\":\"ok\",\"received\":5}\n");

    shutdown.trigger();
}

#[tokio::test]
async fn test_abrupt_disconnects_do_not_affect_other_connections() {
    let cert = common::TestCert::generate();
    let (server, shutdown) = common::start_server(common::test_config(&cert)).await;
    let tcp = server.local_addr(Transport::Tcp).unwrap();
    let tls = server.local_addr(Transport::Tls).unwrap();

    // Connect and vanish mid-body on both raw listeners.
    for addr in [tcp, tls] {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let _ = stream.write_all(b"half a bo").await;
        drop(stream);
    }

    // Plaintext garbage on the TLS port fails the handshake.
    send_garbage(tls).await;

    // A slow client holds a TCP connection open while others complete.
    let mut slow = TcpStream::connect(tcp).await.unwrap();
    slow.write_all(b"slow").await.unwrap();

    let reply = common::tcp_exchange(tcp, b"12345").await;
    assert_eq!(reply, "{\"status\":\"ok\",\"received\":5}\n");

    let reply = common::tls_exchange(tls, &cert, b"12345").await;
    assert_eq!(reply, "{\"status\":\"ok\",\"received\":5}\n");

    slow.shutdown().await.unwrap();
    let mut reply = String::new();
    slow.read_to_string(&mut reply).await.unwrap();
    assert_eq!(reply, "{\"status\":\"ok\",\"received\":4}\n");

    shutdown.trigger();
}

async fn send_garbage(addr: SocketAddr) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let _ = stream.write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await;
    let mut sink = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(2), stream.read_to_end(&mut sink)).await;
}

#[tokio::test]
async fn test_silent_tls_client_is_dropped_after_handshake_timeout() {
    let cert = common::TestCert::generate();
    let mut config = common::test_config(&cert);
    config.timeouts.handshake_secs = 1;
    let (server, shutdown) = common::start_server(config).await;
    let addr = server.local_addr(Transport::Tls).unwrap();

    // Connect and never send a ClientHello.
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let started = Instant::now();

    let mut reply = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut reply))
        .await
        .expect("server never gave up on the handshake");

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(900), "closed too early: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "closed too late: {:?}", elapsed);
    if read.is_ok() {
        assert!(reply.is_empty(), "unexpected reply: {:?}", reply);
    }

    // The listener keeps serving.
    let reply = common::tls_exchange(addr, &cert, b"after").await;
    assert_eq!(reply, "{\"status\":\"ok\",\"received\":5}\n");

    shutdown.trigger();
}

#[test]
fn test_config_error_is_reported_once() {
    let cert = common::TestCert::generate();
    let missing = cert.dir.join("absent.toml");

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_mediator-server"))
        .arg("--config")
        .arg(&missing)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.lines().filter(|l| !l.trim().is_empty()).count(), 1, "{}", stderr);
    assert!(stderr.starts_with("mediator-server: IO error"), "{}", stderr);
    assert!(!stderr.contains("Error:"), "{}", stderr);
}
