use anyhow::{Context, Result};
use nearby_core::Participant;
use nearby_server::{RelayCommand, RelayConfig, RelayServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Timeout for a single expected frame (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// How long "nothing else arrives" is observed for (ms).
pub const SILENCE_MS: u64 = 300;

/// A relay served on an ephemeral localhost port.
pub struct TestRelay {
    pub addr: SocketAddr,
    commands: mpsc::Sender<RelayCommand>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TestRelay {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_static_dir(std::env::temp_dir()).await
    }

    pub async fn spawn_with_static_dir(static_dir: PathBuf) -> Result<Self> {
        let config = RelayConfig {
            listen_addr: "127.0.0.1:0".parse()?,
            static_dir,
            ..RelayConfig::default()
        };
        let server = RelayServer::start(config);
        let listener = server.bind().await?;
        let addr = listener.local_addr()?;
        let commands = server.service().commands();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = server.serve(listener, shutdown).await {
                tracing::error!("[TestRelay] server stopped: {}", e);
            }
        });

        Ok(Self {
            addr,
            commands,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    /// The store as the relay currently sees it.
    pub async fn participants(&self) -> Result<Vec<Participant>> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(RelayCommand::Snapshot { reply })
            .await
            .context("relay is gone")?;
        Ok(rx.await?)
    }

    /// Poll the store until `count` participants remain.
    pub async fn wait_for_count(&self, count: usize) -> Result<Vec<Participant>> {
        let deadline =
            tokio::time::Instant::now() + std::time::Duration::from_millis(SIGNAL_TIMEOUT_MS);
        loop {
            let participants = self.participants().await?;
            if participants.len() == count {
                return Ok(participants);
            }
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!(
                    "expected {} participants, relay has {}",
                    count,
                    participants.len()
                );
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let grace = std::time::Duration::from_millis(1000);
        if tokio::time::timeout(grace, &mut self.task).await.is_err() {
            self.task.abort();
        }
    }
}
