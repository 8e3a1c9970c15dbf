use crate::compression::CompressionRegistry;
use crate::http::request::{HTTP_10, HTTP_11, Method, Request};
use std::collections::HashMap;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Reasons a buffer is not a usable request. Every variant is fatal to the
/// connection that produced it.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing header/body separator")]
    MissingHeaderTerminator,
    #[error("header block is not valid UTF-8")]
    InvalidEncoding,
    #[error("request line must be `<method> <target> <version>`")]
    InvalidRequestLine,
    #[error("unsupported protocol version {0:?}")]
    UnsupportedVersion(String),
}

/// Parses one request out of `buf`.
///
/// The buffer is taken as-is: the body is whatever follows the blank line,
/// and a declared Content-Length longer than that is only logged. Header
/// lines without a `:` are skipped.
pub fn parse_http_request(
    buf: &[u8],
    compression: &CompressionRegistry,
) -> Result<Request, ParseError> {
    // Look for header/body separator
    let headers_end = find_headers_end(buf).ok_or(ParseError::MissingHeaderTerminator)?;
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + HEADER_TERMINATOR.len()..];

    let headers_str =
        std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequestLine)?;
    let mut parts = request_line.split_whitespace();

    let (Some(method), Some(path), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::InvalidRequestLine);
    };

    if version != HTTP_11 && version != HTTP_10 {
        return Err(ParseError::UnsupportedVersion(version.to_string()));
    }

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        match line.split_once(':') {
            Some((key, value)) if !key.is_empty() && !key.contains(char::is_whitespace) => {
                headers.insert(key.to_string(), value.trim().to_string());
            }
            _ => {
                tracing::warn!(line = %line, "Skipping malformed header line");
            }
        }
    }

    let encoding = headers
        .get("Accept-Encoding")
        .and_then(|value| compression.negotiate(value));

    if let Some(declared) = headers.get("Content-Length") {
        match declared.parse::<usize>() {
            Ok(len) if len > body_bytes.len() => {
                tracing::warn!(
                    declared = len,
                    received = body_bytes.len(),
                    "Content-Length exceeds the body received"
                );
            }
            Ok(_) => {}
            Err(_) => {
                tracing::warn!(value = %declared, "Invalid Content-Length header");
            }
        }
    }

    Ok(Request {
        method: Method::from(method),
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body: body_bytes.to_vec(),
        encoding,
    })
}

/// True once `buf` holds a complete header block.
pub fn header_block_complete(buf: &[u8]) -> bool {
    find_headers_end(buf).is_some()
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}
