use std::future::Future;
use std::sync::Arc;

use cork_store::FsBlobStore;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Corkboard HTTP server.
pub struct CorkServer {
    config: ServerConfig,
    state: AppState,
}

impl CorkServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Open the document store named by the configuration, confirm it is
    /// reachable, and prepare the upload directory.
    ///
    /// Fails if no connection string is configured or the store does not
    /// answer a ping.
    pub async fn connect(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let posts = cork_store::connect(config.database_url()?).await?;
        posts.ping().await?;
        info!("connected to document store");
        let blobs = Arc::new(FsBlobStore::open(&config.uploads_dir).await?);
        Ok(Self::new(config, AppState::new(posts, blobs)))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        build_router(self.state.clone(), &self.config)
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router()?;
        let addr = listener.local_addr()?;
        info!("Corkboard server listening on {addr}");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        info!("server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn memory_config(dir: &std::path::Path) -> ServerConfig {
        ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            database_url: Some("memory://".into()),
            uploads_dir: dir.join("uploads"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn connect_requires_connection_string() {
        let result = CorkServer::connect(ServerConfig::default()).await;
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn connect_rejects_unknown_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            database_url: Some("redis://localhost".into()),
            ..memory_config(dir.path())
        };
        let result = CorkServer::connect(config).await;
        assert!(matches!(result, Err(ServerError::Store(_))));
    }

    #[tokio::test]
    async fn connect_prepares_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let server = CorkServer::connect(memory_config(dir.path())).await.unwrap();
        assert!(dir.path().join("uploads").is_dir());
        server.router().unwrap();
    }

    #[tokio::test]
    async fn serves_over_tcp_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let server = CorkServer::connect(memory_config(dir.path())).await.unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_on(listener, async {
            let _ = rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /api/posts HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.to_ascii_lowercase().contains("cache-control: no-store"));
        assert!(response.ends_with("[]"));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
