use crate::config::RelayConfig;
use crate::error::ServerError;
use crate::relay::{InMemoryPresenceStore, PresenceStore, Relay, RelayCommand};
use crate::signaling::{SignalingService, ws_handler};
use axum::{Router, routing::get};
use nearby_core::Participant;
use nearby_core::utils::WS_PATH;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct RelayServer {
    config: RelayConfig,
    service: SignalingService,
    relay_task: JoinHandle<()>,
}

impl RelayServer {
    /// Spawn the relay with an empty in-memory store. Needs a tokio runtime.
    pub fn start(config: RelayConfig) -> Self {
        Self::start_with_store(config, Box::new(InMemoryPresenceStore::new()))
    }

    pub fn start_with_store(config: RelayConfig, store: Box<dyn PresenceStore>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_capacity);
        let service = SignalingService::new(cmd_tx);

        let relay = Relay::new(store, cmd_rx, Arc::new(service.clone()));
        let relay_task = tokio::spawn(relay.run());

        Self {
            config,
            service,
            relay_task,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn service(&self) -> &SignalingService {
        &self.service
    }

    /// `GET /ws` for the event channel, `GET /` for the index page, and the
    /// static directory for everything else.
    pub fn router(&self) -> Router {
        let index = self.config.static_dir.join("index.html");

        Router::new()
            .route(WS_PATH, get(ws_handler))
            .route_service("/", ServeFile::new(index))
            .fallback_service(ServeDir::new(&self.config.static_dir))
            .layer(TraceLayer::new_for_http())
            .with_state(self.service.clone())
    }

    pub async fn participants(&self) -> Result<Vec<Participant>, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.service
            .commands()
            .send(RelayCommand::Snapshot { reply })
            .await
            .map_err(|_| ServerError::RelayGone)?;
        rx.await.map_err(|_| ServerError::RelayGone)
    }

    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.config.listen_addr;
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// Serve until `shutdown` resolves, then stop the relay task.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        if let Ok(addr) = listener.local_addr() {
            info!("Relay listening on http://{}", addr);
        }

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::Serve);

        self.relay_task.abort();
        result
    }
}
