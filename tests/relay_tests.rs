use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use alira::actuator::relay::{HttpRelay, RelayTransport};
use alira::config::Config;
use alira::error::Error;

const RESP_500: &str =
    "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
const RESP_200: &str =
    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 1\r\nConnection: close\r\n\r\n5";

/// Answer one connection with a canned reply and close it, so the client
/// cannot reuse the connection across attempts.
async fn respond(listener: &TcpListener, reply: &str, hits: &AtomicUsize) {
    let (mut sock, _) = listener.accept().await.unwrap();
    let mut buf = [0u8; 1024];
    // The GET these tests issue fits in one read.
    let _ = sock.read(&mut buf).await;
    hits.fetch_add(1, Ordering::SeqCst);
    sock.write_all(reply.as_bytes()).await.unwrap();
    let _ = sock.shutdown().await;
}

fn relay_config(addr: SocketAddr) -> Config {
    let mut config = Config::default();
    config.relay_base_url = format!("http://{addr}/api");
    config.retry_attempts = 3;
    config.retry_base_delay_ms = 20;
    config
}

#[tokio::test]
async fn transient_500s_are_retried_until_success() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let server = {
        let hits = hits.clone();
        tokio::spawn(async move {
            respond(&listener, RESP_500, &hits).await;
            respond(&listener, RESP_500, &hits).await;
            respond(&listener, RESP_200, &hits).await;
        })
    };

    let relay = HttpRelay::new(&relay_config(addr)).unwrap();
    let started = Instant::now();
    let states = relay.status().await.unwrap();

    assert_eq!(states.bitmask, 5);
    assert_eq!(
        hits.load(Ordering::SeqCst),
        3,
        "two retried attempts, then success"
    );
    // Exponential backoff: 20ms after the first failure, 40ms after the
    // second, so the whole call cannot finish faster than their sum.
    assert!(started.elapsed() >= Duration::from_millis(60));
    server.await.unwrap();
}

#[tokio::test]
async fn retry_ceiling_surfaces_a_transient_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let server = {
        let hits = hits.clone();
        tokio::spawn(async move {
            loop {
                respond(&listener, RESP_500, &hits).await;
            }
        })
    };

    let relay = HttpRelay::new(&relay_config(addr)).unwrap();
    let err = relay.status().await.unwrap_err();

    assert!(matches!(err, Error::TransientNetwork(_)));
    assert_eq!(
        hits.load(Ordering::SeqCst),
        3,
        "attempt ceiling bounds the retries"
    );
    server.abort();
}

#[tokio::test]
async fn connection_refusal_is_a_transient_error() {
    // Bind to grab a free port, then drop it so nothing listens there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let relay = HttpRelay::new(&relay_config(addr)).unwrap();
    let err = relay.status().await.unwrap_err();
    assert!(matches!(err, Error::TransientNetwork(_)));
}

#[tokio::test]
async fn client_construction_succeeds_for_a_valid_config() {
    assert!(HttpRelay::new(&Config::default()).is_ok());
}
