use std::time::Duration;

use reqwest::{header, Client};

use super::types::MAX_FEED_BYTES;
use crate::errors::{AppError, AppResult};

const USER_AGENT: &str = "gator";

// See: https://stackoverflow.com/a/7001617/5155484
const ACCEPT: &str =
    "application/rss+xml, application/rdf+xml, application/xml;q=0.9, text/xml;q=0.8";

/// Retrieves raw feed documents over HTTP.
///
/// One request per call, bounded by the client timeout. There is no retry
/// here; a failed feed is picked up again on a later scheduler tick.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch the body at `url`.
    ///
    /// Non-2xx responses are a hard error; the body is not parsed.
    pub async fn fetch(&self, url: &str) -> AppResult<Vec<u8>> {
        let mut response = self
            .client
            .get(url)
            .header(header::ACCEPT, ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Http {
                status: status.as_u16(),
            });
        }

        if let Some(content_length) = response.content_length() {
            if content_length > MAX_FEED_BYTES as u64 {
                return Err(too_large(content_length as usize));
            }
        }

        // Content-Length is optional, so the cap is also enforced per chunk.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > MAX_FEED_BYTES {
                return Err(too_large(body.len() + chunk.len()));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

fn too_large(len: usize) -> AppError {
    AppError::Network(format!(
        "feed too large: {len} bytes (max {MAX_FEED_BYTES} bytes)"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `response` verbatim to the first connection and hands back
    /// the raw request it received.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{addr}/feed.xml"), handle)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_sends_user_agent() {
        let (url, server) = serve_once(http_response("200 OK", "<rss/>")).await;
        let fetcher = FeedFetcher::new(Duration::from_secs(5)).unwrap();

        let body = fetcher.fetch(&url).await.unwrap();
        assert_eq!(body, b"<rss/>");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.contains("user-agent: gator"));
        assert!(request.contains("accept: application/rss+xml"));
    }

    #[tokio::test]
    async fn test_oversized_chunked_body_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nTransfer-Encoding: chunked\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            // No Content-Length: the client only learns the size by reading.
            let chunk = vec![b'a'; 64 * 1024];
            for _ in 0..(MAX_FEED_BYTES / chunk.len() + 2) {
                let mut framed = format!("{:x}\r\n", chunk.len()).into_bytes();
                framed.extend_from_slice(&chunk);
                framed.extend_from_slice(b"\r\n");
                if socket.write_all(&framed).await.is_err() {
                    return;
                }
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });

        let fetcher = FeedFetcher::new(Duration::from_secs(10)).unwrap();
        let err = fetcher
            .fetch(&format!("http://{addr}/feed.xml"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Network(ref m) if m.contains("too large")));
    }

    #[tokio::test]
    async fn test_oversized_content_length_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                MAX_FEED_BYTES + 1
            );
            let _ = socket.write_all(head.as_bytes()).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let fetcher = FeedFetcher::new(Duration::from_secs(10)).unwrap();
        let err = fetcher
            .fetch(&format!("http://{addr}/feed.xml"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Network(ref m) if m.contains("too large")));
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let (url, _server) = serve_once(http_response("404 Not Found", "nope")).await;
        let fetcher = FeedFetcher::new(Duration::from_secs(5)).unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, AppError::Http { status: 404 }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = FeedFetcher::new(Duration::from_secs(2)).unwrap();
        let err = fetcher.fetch(&format!("http://{addr}/")).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let fetcher = FeedFetcher::new(Duration::from_millis(200)).unwrap();
        let err = fetcher.fetch(&format!("http://{addr}/")).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }
}
