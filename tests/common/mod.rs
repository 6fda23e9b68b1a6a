//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use transfer_stats::config::HttpClientConfig;

/// Mock response: status code and body chunks.
///
/// With one chunk the response carries `Content-Length`; with several it is
/// sent with `Transfer-Encoding: chunked`.
#[allow(dead_code)]
pub struct MockResponse {
    pub status: u16,
    pub chunks: Vec<Vec<u8>>,
}

#[allow(dead_code)]
impl MockResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            chunks: vec![body.into()],
        }
    }

    pub fn chunked(status: u16, chunks: Vec<Vec<u8>>) -> Self {
        Self { status, chunks }
    }

    /// Header section exactly as written on the wire.
    pub fn head(&self) -> String {
        let reason = match self.status {
            200 => "OK",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "OK",
        };
        if self.chunks.len() == 1 {
            format!(
                "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                self.status,
                reason,
                self.chunks[0].len()
            )
        } else {
            format!(
                "HTTP/1.1 {} {}\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
                self.status, reason
            )
        }
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = self.head().into_bytes();
        if self.chunks.len() == 1 {
            out.extend_from_slice(&self.chunks[0]);
        } else {
            for chunk in &self.chunks {
                out.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
                out.extend_from_slice(chunk);
                out.extend_from_slice(b"\r\n");
            }
            out.extend_from_slice(b"0\r\n\r\n");
        }
        out
    }
}

/// Read the request head and return its request target.
async fn read_target(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    head.split(' ').nth(1).map(str::to_string)
}

/// Start a programmable mock backend; `f` maps the request target to a response.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(target) = read_target(&mut socket).await else {
                            return;
                        };
                        let response = f(target).await;
                        let _ = socket.write_all(&response.encode()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock backend that always answers with `body`.
#[allow(dead_code)]
pub async fn start_mock_backend(body: &'static [u8]) -> SocketAddr {
    start_programmable_backend(move |_| async move { MockResponse::ok(body) }).await
}

/// Start a backend that answers every request with `raw` bytes, then closes.
#[allow(dead_code)]
pub async fn start_raw_backend(raw: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if read_target(&mut socket).await.is_none() {
                    return;
                }
                let _ = socket.write_all(raw).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a backend that reads a chunked request body to its last chunk, then
/// answers with `body`.
#[allow(dead_code)]
pub async fn start_upload_backend(body: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.ends_with(b"0\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let _ = socket.write_all(&MockResponse::ok(body).encode()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a backend that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let held = Arc::new(Mutex::new(Vec::new()));

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            held.lock().unwrap().push(socket);
        }
    });

    addr
}

/// Client configuration used across tests.
#[allow(dead_code)]
pub fn test_config() -> HttpClientConfig {
    HttpClientConfig {
        concurrent_transfers: 4,
        user_agent: "transfer-stats-test".into(),
        request_timeout_secs: 5,
    }
}

/// In-memory transfer log.
#[allow(dead_code)]
pub fn memory_sink() -> Arc<Mutex<Vec<u8>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// Transfer lines (preamble excluded) written to `sink`.
#[allow(dead_code)]
pub fn transfer_lines(sink: &Mutex<Vec<u8>>) -> Vec<String> {
    let out = String::from_utf8(sink.lock().unwrap().clone()).unwrap();
    out.lines()
        .filter(|l| l.starts_with("key="))
        .map(str::to_string)
        .collect()
}

/// Value of `name` in a `key=value` line.
#[allow(dead_code)]
pub fn field<'a>(line: &'a str, name: &str) -> &'a str {
    line.split(' ')
        .find_map(|kv| kv.strip_prefix(name).and_then(|v| v.strip_prefix('=')))
        .unwrap_or_else(|| panic!("field {} missing in {:?}", name, line))
}
