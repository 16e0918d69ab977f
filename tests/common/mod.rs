#![allow(dead_code)]

use gator::{initialize_db_pool, run_migrations, DbPool};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// File-backed database so every pooled connection sees the same data.
pub fn create_test_db(max_size: u32) -> (TempDir, DbPool) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = initialize_db_pool(&db_path.display().to_string(), max_size)
        .expect("Failed to create pool");
    let mut conn = pool.get().expect("Failed to get connection");
    run_migrations(&mut conn).expect("Failed to run migrations");

    (temp_dir, pool)
}

pub fn rss_document(items: &[(&str, &str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link, pub_date)| {
            format!(
                "<item><title>{title}</title><link>{link}</link><description>{title} body</description><pubDate>{pub_date}</pubDate></item>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Test Feed</title><link>https://feed.example/</link><description>test</description>{items}</channel></rss>"#
    )
}

/// Serve `body` as an RSS document to every connection until the task is
/// aborted. Returns the feed URL.
pub async fn serve_rss(body: String) -> (String, tokio::task::JoinHandle<()>) {
    serve(format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ))
    .await
}

pub async fn serve_status(status: &str) -> (String, tokio::task::JoinHandle<()>) {
    serve(format!(
        "HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    ))
    .await
}

async fn serve(response: String) -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let response = response.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    (format!("http://{addr}/feed.xml"), handle)
}
