#![allow(dead_code)]

use std::collections::HashMap;

use tokio::io::{AsyncRead, AsyncReadExt};

/// A response as seen by a client.
#[derive(Debug)]
pub struct WireResponse {
    pub status_line: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl WireResponse {
    pub fn status(&self) -> u16 {
        self.status_line
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Reads exactly one Content-Length framed response off `stream`.
///
/// `pending` carries bytes read past the previous response.
pub async fn read_response<S>(stream: &mut S, pending: &mut Vec<u8>) -> Option<WireResponse>
where
    S: AsyncRead + Unpin,
{
    let head_end = loop {
        if let Some(pos) = pending.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let mut chunk = [0u8; 512];
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return None;
        }
        pending.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8(pending[..head_end].to_vec()).unwrap();
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap().to_string();
    let headers: HashMap<String, String> = lines
        .map(|line| {
            let (k, v) = line.split_once(": ").unwrap();
            (k.to_string(), v.to_string())
        })
        .collect();

    let length: usize = headers
        .get("Content-Length")
        .map(|v| v.parse().unwrap())
        .unwrap_or(0);

    pending.drain(..head_end + 4);
    while pending.len() < length {
        let mut chunk = [0u8; 512];
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "stream closed mid-body");
        pending.extend_from_slice(&chunk[..n]);
    }
    let body: Vec<u8> = pending.drain(..length).collect();

    Some(WireResponse {
        status_line,
        headers,
        body,
    })
}

/// True once the peer has closed its side and nothing else is pending.
pub async fn at_eof<S>(stream: &mut S) -> bool
where
    S: AsyncRead + Unpin,
{
    let mut byte = [0u8; 1];
    matches!(stream.read(&mut byte).await, Ok(0))
}
