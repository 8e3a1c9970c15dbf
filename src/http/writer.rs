use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Last-resort wire message used when a response cannot be rendered.
///
/// Distinct from a handler-produced 500: it always closes the connection.
pub const FALLBACK_RESPONSE: &[u8] = b"HTTP/1.1 500 Internal Server Error\r\n\
Connection: close\r\n\
Content-Length: 21\r\n\
\r\n\
Internal Server Error";

#[derive(Debug, thiserror::Error)]
enum RenderError {
    #[error("header name {0:?} is not a valid token")]
    HeaderName(String),
    #[error("header {0:?} has a value containing a line break")]
    HeaderValue(String),
    #[error("response carries {0} Content-Length headers")]
    DuplicateLength(usize),
}

fn valid_header_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b':')
}

fn render(resp: &Response) -> Result<Vec<u8>, RenderError> {
    let mut buf = Vec::with_capacity(128 + resp.body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Header names are matched case-insensitively on the wire.
    let explicit_lengths = resp
        .headers
        .keys()
        .filter(|k| k.eq_ignore_ascii_case("Content-Length"))
        .count();
    if explicit_lengths > 1 {
        return Err(RenderError::DuplicateLength(explicit_lengths));
    }

    let computed_length = (explicit_lengths == 0 && !resp.status.forbids_body())
        .then(|| resp.body.len().to_string());

    let headers = resp
        .headers
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain(computed_length.as_deref().map(|len| ("Content-Length", len)));

    let mut sorted: Vec<(&str, &str)> = headers.collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    for (k, v) in sorted {
        if !valid_header_name(k) {
            return Err(RenderError::HeaderName(k.to_string()));
        }
        if v.contains(['\r', '\n']) {
            return Err(RenderError::HeaderValue(k.to_string()));
        }
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    if !resp.status.forbids_body() {
        buf.extend_from_slice(&resp.body);
    }

    Ok(buf)
}

/// Renders a response to wire bytes.
///
/// Never fails: a response that cannot be framed safely (for example a
/// header value with an embedded CRLF) degrades to [`FALLBACK_RESPONSE`].
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    match render(resp) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, status = resp.status.as_u16(), "Falling back to static 500 response");
            FALLBACK_RESPONSE.to_vec()
        }
    }
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
    fallback: bool,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        let buffer = serialize_response(response);
        let fallback = buffer == FALLBACK_RESPONSE;
        Self {
            buffer,
            written: 0,
            fallback,
        }
    }

    /// True when the response was replaced by the static fallback.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Writes the remaining bytes, looping over short writes.
    pub async fn write_to_stream<S>(&mut self, stream: &mut S) -> anyhow::Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
