use futures::{SinkExt, StreamExt};
use nearby_core::{ClientEvent, Frame, ServerEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::ConnectionError;

/// WebSocket link to the relay. When either direction ends both stop.
pub struct RelayConnection {
    outbound: mpsc::UnboundedSender<ClientEvent>,
    inbound: mpsc::UnboundedReceiver<ServerEvent>,
    task: JoinHandle<()>,
}

impl RelayConnection {
    pub async fn connect(url: &str) -> Result<Self, ConnectionError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(ConnectionError::Connect)?;
        info!("Connected to relay at {}", url);

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientEvent>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerEvent>();

        let task = tokio::spawn(async move {
            let send = async {
                while let Some(event) = out_rx.recv().await {
                    let json = match event.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("Failed to encode {}: {}", event.name(), e);
                            continue;
                        }
                    };
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                let _ = sink.close().await;
            };

            let recv = async {
                while let Some(Ok(msg)) = stream.next().await {
                    match msg {
                        Message::Text(text) => match ServerEvent::from_json(text.as_str()) {
                            Ok(event) => {
                                if in_tx.send(event).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Malformed frame from relay: {}", e),
                        },
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
            };

            tokio::select! {
                _ = send => debug!("Relay send pump finished"),
                _ = recv => debug!("Relay receive pump finished"),
            }
            info!("Relay connection closed");
        });

        Ok(Self {
            outbound: out_tx,
            inbound: in_rx,
            task,
        })
    }

    pub fn send(&self, event: ClientEvent) -> Result<(), ConnectionError> {
        self.outbound
            .send(event)
            .map_err(|_| ConnectionError::Closed)
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<ClientEvent> {
        self.outbound.clone()
    }

    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.inbound.recv().await
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }

    /// Split into the queues a `ClientAgent` runs on. The pumps keep running
    /// until one side closes.
    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedSender<ClientEvent>,
        mpsc::UnboundedReceiver<ServerEvent>,
    ) {
        (self.outbound, self.inbound)
    }
}
