//! Shared utilities for integration and load testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};
use tokio::sync::mpsc;

use payments_balancer::config::ProxyConfig;
use payments_balancer::http::framing::RequestFramer;
use payments_balancer::lifecycle::Shutdown;
use payments_balancer::net::Listener;
use payments_balancer::ProxyServer;

static SOCKET_SEQ: AtomicUsize = AtomicUsize::new(0);

/// A fresh socket path under the temp dir, unique per test process and call.
pub fn socket_path(name: &str) -> PathBuf {
    let seq = SOCKET_SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("pb-{}-{}-{}.sock", name, std::process::id(), seq))
}

/// How a mock backend answers one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Write the bytes, then close.
    Close(Bytes),
    /// Write the bytes and keep the connection open for a while.
    KeepOpen(Bytes),
    /// Wait, then write the bytes and close.
    Delayed(Duration, Bytes),
    /// Write the bytes, then drop the connection without finishing.
    Truncated(Bytes),
}

/// Handle to a running mock backend.
pub struct MockBackend {
    pub path: PathBuf,
    pub received: mpsc::UnboundedReceiver<Bytes>,
}

impl MockBackend {
    pub fn address(&self) -> String {
        self.path.display().to_string()
    }

    /// Wait for the next request this backend received.
    pub async fn next_request(&mut self) -> Bytes {
        tokio::time::timeout(Duration::from_secs(2), self.received.recv())
            .await
            .expect("backend received nothing")
            .expect("backend task ended")
    }

    /// Count requests already received, without waiting.
    pub fn drain_count(&mut self) -> usize {
        let mut n = 0;
        while self.received.try_recv().is_ok() {
            n += 1;
        }
        n
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Start a Unix-socket backend that records each full request and answers with `reply`.
pub fn start_unix_backend(name: &str, reply: Reply) -> MockBackend {
    let path = socket_path(name);
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path).unwrap();
    let (tx, received) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let tx = tx.clone();
            let reply = reply.clone();
            tokio::spawn(async move {
                serve_one(socket, tx, reply).await;
            });
        }
    });

    MockBackend { path, received }
}

async fn serve_one(mut socket: UnixStream, tx: mpsc::UnboundedSender<Bytes>, reply: Reply) {
    let mut buf = BytesMut::new();
    let mut framer = RequestFramer::new(64, 1024 * 1024);
    loop {
        match socket.read_buf(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if let Ok(Some(len)) = framer.poll(&buf) {
            buf.truncate(len);
            break;
        }
    }
    if buf.is_empty() {
        return;
    }
    let _ = tx.send(buf.freeze());

    match reply {
        Reply::Close(bytes) => {
            let _ = socket.write_all(&bytes).await;
            let _ = socket.shutdown().await;
        }
        Reply::KeepOpen(bytes) => {
            let _ = socket.write_all(&bytes).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        Reply::Delayed(delay, bytes) => {
            tokio::time::sleep(delay).await;
            let _ = socket.write_all(&bytes).await;
            let _ = socket.shutdown().await;
        }
        Reply::Truncated(bytes) => {
            let _ = socket.write_all(&bytes).await;
        }
    }
}

/// Start a TCP backend answering every request with a fixed JSON body.
pub async fn start_tcp_backend(body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = BytesMut::new();
                let mut framer = RequestFramer::new(64, 1024 * 1024);
                while let Ok(n) = socket.read_buf(&mut buf).await {
                    if n == 0 || matches!(framer.poll(&buf), Ok(Some(_))) {
                        break;
                    }
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// A proxy running on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Arc<Shutdown>,
    pub task: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the proxy over `backends`, letting the caller adjust the config first.
pub async fn start_proxy_with<F>(backends: Vec<String>, tweak: F) -> TestProxy
where
    F: FnOnce(&mut ProxyConfig),
{
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.backends = backends;
    config.timeouts.backend_ms = 500;
    config.timeouts.client_read_ms = 500;
    config.timeouts.shutdown_drain_secs = 1;
    tweak(&mut config);

    let server = ProxyServer::new(&config).unwrap();
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Arc::new(Shutdown::new());
    let signal = shutdown.subscribe();
    let task = tokio::spawn(server.run(listener, signal));

    TestProxy { addr, shutdown, task }
}

pub async fn start_proxy(backends: Vec<String>) -> TestProxy {
    start_proxy_with(backends, |_| {}).await
}

/// Send `chunks` as separate writes and return everything the proxy replies.
pub async fn send_raw(addr: SocketAddr, chunks: &[&[u8]]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.set_nodelay(true).unwrap();
    for chunk in chunks {
        stream.write_all(chunk).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let mut reply = Vec::new();
    tokio::time::timeout(Duration::from_secs(3), stream.read_to_end(&mut reply))
        .await
        .expect("proxy did not close the connection")
        .unwrap();
    reply
}

pub const PAYMENT: &[u8] =
    b"POST /payments HTTP/1.1\r\nHost: lb\r\nContent-Type: application/json\r\nContent-Length: 12\r\n\r\n{\"amount\":1}";

pub const SUMMARY: &[u8] = b"GET /payments-summary?from=2025-01-01 HTTP/1.1\r\nHost: lb\r\n\r\n";

pub const PURGE: &[u8] = b"POST /purge-payments HTTP/1.1\r\nHost: lb\r\nContent-Length: 0\r\n\r\n";
