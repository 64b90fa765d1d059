//! Scripted local HTTP responder for client and adapter tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use game_ledger_core::DataSource;
use game_ledger_scraper::{BackoffPolicy, ClientConfig, RateLimit, TimeUnit};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type Handler = dyn Fn(&str, usize) -> (u16, String) + Send + Sync;

/// A server on 127.0.0.1 that answers each request with whatever the
/// handler returns for `(request target, hit index)`.
pub struct MockServer {
    pub base: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    pub async fn start(handler: impl Fn(&str, usize) -> (u16, String) + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handler: Arc<Handler> = Arc::new(handler);
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let (task_hits, task_requests) = (Arc::clone(&hits), Arc::clone(&requests));
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let handler = Arc::clone(&handler);
                let hits = Arc::clone(&task_hits);
                let requests = Arc::clone(&task_requests);
                tokio::spawn(async move {
                    let head = read_head(&mut stream).await;
                    let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                    let index = hits.fetch_add(1, Ordering::SeqCst);
                    requests.lock().unwrap().push(head);

                    let (status, body) = handler(&target, index);
                    let response = format!(
                        "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            base: format!("http://{}", addr),
            hits,
            requests,
        }
    }

    /// Same answer to every request.
    pub async fn always(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::start(move |_, _| (status, body.clone())).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Raw request heads received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_head(stream: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Client policy with millisecond spacing and retries, so tests run in
/// real time without waiting on production limits.
pub fn fast_config(source: DataSource, max_attempts: u32) -> ClientConfig {
    ClientConfig::new(source, RateLimit::new(1000, TimeUnit::Second))
        .backoff(BackoffPolicy {
            initial: Duration::from_millis(10),
            exponent: 1.0,
            max_attempts,
            max_delay: Duration::from_millis(50),
        })
        .timeout(Duration::from_secs(5))
}
