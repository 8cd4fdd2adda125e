use crate::relay::RelayCommand;
use crate::signaling::SignalingService;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use nearby_core::{ClientEvent, Frame, ParticipantId};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// `GET /ws`: upgrade and hand the socket to the relay under a fresh id.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    let participant_id = ParticipantId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, participant_id, service))
}

async fn handle_socket(socket: WebSocket, participant_id: ParticipantId, service: SignalingService) {
    info!("New WebSocket connection: {}", participant_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_channel(participant_id, tx);

    if let Err(e) = service
        .relay_cmd_tx
        .send(RelayCommand::Connect { participant_id })
        .await
    {
        error!("Relay died: {}", e);
        service.remove_channel(&participant_id);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match ClientEvent::from_json(text.as_str()) {
                        Ok(event) => {
                            debug!("{} <- {}", event.name(), participant_id);
                            let cmd = RelayCommand::Event {
                                participant_id,
                                event,
                            };
                            if let Err(e) = service.relay_cmd_tx.send(cmd).await {
                                error!("Relay died: {}", e);
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid frame from {}: {}", participant_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    let _ = service
        .relay_cmd_tx
        .send(RelayCommand::Disconnect { participant_id })
        .await;

    service.remove_channel(&participant_id);
    info!("WebSocket disconnected: {}", participant_id);
}
