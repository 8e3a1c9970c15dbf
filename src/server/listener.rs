use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{Instrument, info};

use crate::compression::{self, CompressionRegistry};
use crate::config::Config;
use crate::http::connection::{Connection, SessionContext, SessionLimits};
use crate::router::Router;
use crate::routes;

/// Accepts connections and runs one session task per connection.
///
/// The router and compression registry are frozen when the server is
/// built; sessions only ever read them.
#[derive(Debug, Clone)]
pub struct Server {
    ctx: SessionContext,
}

impl Server {
    pub fn new(router: Router, compression: Arc<CompressionRegistry>, limits: SessionLimits) -> Self {
        Self {
            ctx: SessionContext {
                router: Arc::new(router),
                compression,
                limits,
            },
        }
    }

    /// Builds the registry and application routes described by `cfg`.
    pub fn from_config(cfg: &Config) -> Self {
        let mut registry = CompressionRegistry::new();
        for compressor in cfg.compression.encodings.iter().filter_map(|name| compression::builtin(name)) {
            registry.register_boxed(compressor);
        }
        let registry = Arc::new(registry);

        let router = routes::app_router(cfg.files.root.clone(), Arc::clone(&registry));
        Self::new(router, registry, cfg.limits())
    }

    /// Spawns a session for one accepted stream.
    pub fn spawn_session<S>(&self, stream: S, peer: SocketAddr) -> JoinHandle<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let conn = Connection::new(stream, self.ctx.clone());
        let span = tracing::info_span!("connection", %peer);

        tokio::spawn(
            async move {
                if let Err(e) = conn.run().await {
                    tracing::error!("Connection error: {}", e);
                }
            }
            .instrument(span),
        )
    }

    /// Accept loop. A failed accept is logged and the loop carries on.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer)) => {
                    info!("Accepted connection from {}", peer);
                    self.spawn_session(socket, peer);
                }
                Err(e) => {
                    // EMFILE and friends; back off instead of spinning.
                    tracing::warn!(error = %e, "Accept failed");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("binding {}", cfg.server.listen_addr))?;
    info!("Listening on {}", cfg.server.listen_addr);

    Server::from_config(cfg).serve(listener).await
}
