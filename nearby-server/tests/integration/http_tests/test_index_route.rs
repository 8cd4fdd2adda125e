use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::integration::init_tracing;
use crate::utils::TestRelay;

fn static_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nearby-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>nearby</h1>").unwrap();
    dir
}

async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_index_route() {
    init_tracing();

    let dir = static_dir();
    let relay = TestRelay::spawn_with_static_dir(dir.clone())
        .await
        .expect("Failed to start relay");

    let index = get(relay.addr, "/").await;
    assert!(index.starts_with("HTTP/1.1 200"), "got: {index}");
    assert!(index.contains("<h1>nearby</h1>"));

    let static_file = get(relay.addr, "/index.html").await;
    assert!(static_file.starts_with("HTTP/1.1 200"));

    let missing = get(relay.addr, "/nope.js").await;
    assert!(missing.starts_with("HTTP/1.1 404"), "got: {missing}");

    relay.stop().await;
    let _ = std::fs::remove_dir_all(dir);
}
