use crate::relay::RelayCommand;
use crate::signaling::Broadcaster;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use nearby_core::{Frame, ParticipantId, ServerEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

struct Channel {
    tx: mpsc::UnboundedSender<Message>,
    admitted: bool,
}

struct SignalingInner {
    channels: DashMap<ParticipantId, Channel>,
}

/// Registry of open WebSocket channels plus the queue into the relay.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) relay_cmd_tx: mpsc::Sender<RelayCommand>,
}

impl SignalingService {
    pub fn new(relay_cmd_tx: mpsc::Sender<RelayCommand>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                channels: DashMap::new(),
            }),
            relay_cmd_tx,
        }
    }

    pub fn add_channel(&self, participant_id: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.channels.insert(
            participant_id,
            Channel {
                tx,
                admitted: false,
            },
        );
    }

    pub fn remove_channel(&self, participant_id: &ParticipantId) {
        self.inner.channels.remove(participant_id);
    }

    pub fn channel_count(&self) -> usize {
        self.inner.channels.len()
    }

    pub fn commands(&self) -> mpsc::Sender<RelayCommand> {
        self.relay_cmd_tx.clone()
    }

    fn encode(event: &ServerEvent) -> Option<Message> {
        match event.to_json() {
            Ok(json) => Some(Message::Text(json.into())),
            Err(e) => {
                error!("Failed to serialize {} event: {}", event.name(), e);
                None
            }
        }
    }
}

#[async_trait]
impl Broadcaster for SignalingService {
    async fn send_to(&self, participant_id: ParticipantId, event: ServerEvent) {
        let Some(channel) = self.inner.channels.get(&participant_id) else {
            debug!(
                "Dropping {} for disconnected channel {}",
                event.name(),
                participant_id
            );
            return;
        };
        let Some(msg) = Self::encode(&event) else {
            return;
        };
        // The writer task may have exited already; that is a disconnect in progress.
        if channel.tx.send(msg).is_err() {
            debug!("Channel {} closed before {} was queued", participant_id, event.name());
        }
    }

    async fn broadcast(&self, except: Option<ParticipantId>, event: ServerEvent) {
        let Some(msg) = Self::encode(&event) else {
            return;
        };

        for entry in self.inner.channels.iter() {
            if Some(*entry.key()) == except || !entry.value().admitted {
                continue;
            }
            let _ = entry.value().tx.send(msg.clone());
        }
    }

    async fn admit(&self, participant_id: ParticipantId) {
        if let Some(mut channel) = self.inner.channels.get_mut(&participant_id) {
            channel.admitted = true;
        }
    }
}
