use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::compression::CompressionRegistry;
use crate::http::parser::{header_block_complete, parse_http_request};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::router::Router;

const READ_CHUNK: usize = 1024;

/// Per-connection resource limits.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Requests served on one socket before it is closed regardless of
    /// keep-alive.
    pub max_requests: usize,
    /// Bytes buffered while waiting for the end of a header block.
    pub max_header_bytes: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_requests: 100,
            max_header_bytes: 8 * 1024,
        }
    }
}

/// Everything a session needs from the server, shared read-only.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub router: Arc<Router>,
    pub compression: Arc<CompressionRegistry>,
    pub limits: SessionLimits,
}

pub enum ConnectionState {
    AwaitingRequest,
    Parsed(Request),
    Dispatched(ResponseWriter, bool), // bool = keep_alive?
    Responded(bool),
    Closed,
}

/// One accepted connection.
///
/// `run` consumes the connection, so the stream is shut down and dropped
/// exactly once however the loop ends.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    served: usize,
    ctx: SessionContext,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(stream: S, ctx: SessionContext) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::AwaitingRequest,
            served: 0,
            ctx,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let result = self.drive().await;

        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(error = %e, "Shutdown after session end failed");
        }
        tracing::debug!(served = self.served, "Connection closed");

        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitingRequest => {
                    let Some(raw) = self.read_request().await else {
                        self.state = ConnectionState::Closed;
                        continue;
                    };

                    match parse_http_request(&raw, &self.ctx.compression) {
                        Ok(req) => {
                            self.state = ConnectionState::Parsed(req);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Rejecting malformed request");
                            let mut writer = ResponseWriter::new(&Response::bad_request());
                            writer.write_to_stream(&mut self.stream).await?;
                            self.served += 1;
                            self.state = ConnectionState::Closed;
                        }
                    }
                }

                ConnectionState::Parsed(req) => {
                    let keep_alive = self.keep_alive_after(&req);
                    let mut response = dispatch(Arc::clone(&self.ctx.router), req).await;

                    response.set_header("Connection", if keep_alive { "keep-alive" } else { "close" });

                    let writer = ResponseWriter::new(&response);
                    let keep_alive = keep_alive && !writer.is_fallback();
                    self.state = ConnectionState::Dispatched(writer, keep_alive);
                }

                ConnectionState::Dispatched(mut writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.served += 1;
                    self.state = ConnectionState::Responded(keep_alive);
                }

                ConnectionState::Responded(keep_alive) => {
                    self.state = if keep_alive {
                        ConnectionState::AwaitingRequest // go back for next request
                    } else {
                        ConnectionState::Closed
                    };
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Keep-alive decision for the response to `req`, including the
    /// per-connection request cap.
    fn keep_alive_after(&self, req: &Request) -> bool {
        req.keep_alive() && self.served + 1 < self.ctx.limits.max_requests
    }

    /// Buffers bytes until a full header block is present.
    ///
    /// Returns `None` when the peer closes or the read fails. Once
    /// `max_header_bytes` is reached the incomplete buffer is handed over
    /// anyway and the parser rejects it.
    async fn read_request(&mut self) -> Option<BytesMut> {
        loop {
            if header_block_complete(&self.buffer)
                || self.buffer.len() >= self.ctx.limits.max_header_bytes
            {
                return Some(self.buffer.split());
            }

            self.buffer.reserve(READ_CHUNK);
            match self.stream.read_buf(&mut self.buffer).await {
                Ok(0) => {
                    if !self.buffer.is_empty() {
                        tracing::debug!(buffered = self.buffer.len(), "Peer closed mid-request");
                    }
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "Read failed");
                    return None;
                }
            }
        }
    }
}

/// Runs the router off the async worker threads. Handlers do blocking
/// file I/O, and a panicking handler becomes a 500.
async fn dispatch(router: Arc<Router>, req: Request) -> Response {
    let method = req.method.clone();
    let path = req.path.clone();

    let response = match tokio::task::spawn_blocking(move || router.dispatch(&req)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            let status = e.status();
            tracing::warn!(method = %method, path = %path, status = status.as_u16(), error = %e, "Handler failed");
            e.into_response()
        }
        Err(e) => {
            tracing::error!(method = %method, path = %path, error = %e, "Handler panicked");
            Response::internal_error()
        }
    };

    tracing::info!(method = %method, path = %path, status = response.status.as_u16(), "Served request");
    response
}
