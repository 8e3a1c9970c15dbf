mod common;

use burrow::config::Config;
use burrow::server::Server;
use common::read_response;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

async fn start(cfg: &Config) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::from_config(cfg);
    tokio::spawn(async move { server.serve(listener).await });
    addr
}

#[tokio::test]
async fn test_serves_concurrent_connections_over_tcp() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.files.root = dir.path().to_path_buf();
    let addr = start(&cfg).await;

    let mut clients = Vec::new();
    for i in 0..8 {
        clients.push(tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let mut pending = Vec::new();
            let request = format!("GET /echo/client{i} HTTP/1.1\r\nHost: localhost\r\n\r\n");
            stream.write_all(request.as_bytes()).await.unwrap();
            let response = read_response(&mut stream, &mut pending).await.unwrap();
            (i, response)
        }));
    }

    for client in clients {
        let (i, response) = client.await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.body, format!("client{i}").into_bytes());
    }
}

#[tokio::test]
async fn test_configured_encodings_drive_negotiation() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.files.root = dir.path().to_path_buf();
    cfg.compression.encodings = vec!["deflate".to_string()];
    let addr = start(&cfg).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut pending = Vec::new();

    stream
        .write_all(b"GET /echo/hello HTTP/1.1\r\nAccept-Encoding: gzip, deflate\r\n\r\n")
        .await
        .unwrap();
    let response = read_response(&mut stream, &mut pending).await.unwrap();

    assert_eq!(response.header("Content-Encoding"), Some("deflate"));
}
