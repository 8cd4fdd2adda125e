use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::relay::presence_store::PresenceStore;
use crate::relay::relay_command::RelayCommand;
use crate::signaling::Broadcaster;
use nearby_core::{ClientEvent, Frame, Participant, ParticipantId, Position, ServerEvent, Status};

/// Owns the presence store and processes one command at a time, so every
/// handler runs to completion before the next event is looked at.
pub struct Relay {
    store: Box<dyn PresenceStore>,
    command_rx: mpsc::Receiver<RelayCommand>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl Relay {
    pub fn new(
        store: Box<dyn PresenceStore>,
        command_rx: mpsc::Receiver<RelayCommand>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            store,
            command_rx,
            broadcaster,
        }
    }

    pub async fn run(mut self) {
        info!("Relay event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Relay event loop finished");
    }

    async fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Connect { participant_id } => self.on_connect(participant_id).await,

            RelayCommand::Event {
                participant_id,
                event,
            } => self.on_event(participant_id, event).await,

            RelayCommand::Disconnect { participant_id } => {
                self.on_disconnect(participant_id).await
            }

            RelayCommand::Snapshot { reply } => {
                let _ = reply.send(self.store.snapshot());
            }
        }
    }

    async fn on_connect(&mut self, id: ParticipantId) {
        info!("User connected: {}", id);

        let participant = Participant::joined(id);
        self.store.insert(participant.clone());
        debug!("Current users: {}", self.store.len());

        self.broadcaster
            .send_to(id, ServerEvent::Welcome { id })
            .await;
        self.broadcaster
            .send_to(id, ServerEvent::ExistingUsers(self.store.snapshot()))
            .await;
        self.broadcaster.admit(id).await;

        self.broadcaster
            .broadcast(Some(id), ServerEvent::UserJoined(participant))
            .await;
        self.broadcaster
            .broadcast(
                None,
                ServerEvent::StatusUpdate {
                    id,
                    status: Status::Online,
                },
            )
            .await;
    }

    async fn on_event(&mut self, sender: ParticipantId, event: ClientEvent) {
        match event {
            ClientEvent::UpdatePosition { id, x, y } => {
                if !self.owns(sender, id) {
                    return;
                }
                let Some(participant) = self.store.get_mut(&sender) else {
                    debug!("Position update for unknown user {}", sender);
                    return;
                };
                participant.set_position(Position::new(x, y));
                debug!("Position updated for {}: ({}, {})", sender, x, y);

                self.broadcaster
                    .broadcast(
                        Some(sender),
                        ServerEvent::UpdatePosition { id: sender, x, y },
                    )
                    .await;
            }

            ClientEvent::UpdateStatus { status } => self.set_status(sender, status).await,

            ClientEvent::StatusChange { id, status } => {
                if self.owns(sender, Some(id)) {
                    self.set_status(sender, status).await;
                }
            }

            ClientEvent::Offer { target_id, offer } => {
                self.forward(
                    target_id,
                    ServerEvent::Offer {
                        sender_id: sender,
                        offer,
                    },
                )
                .await;
            }

            ClientEvent::Answer { target_id, answer } => {
                self.forward(
                    target_id,
                    ServerEvent::Answer {
                        sender_id: sender,
                        answer,
                    },
                )
                .await;
            }

            ClientEvent::IceCandidate {
                target_id,
                candidate,
            } => {
                self.forward(
                    target_id,
                    ServerEvent::IceCandidate {
                        sender_id: sender,
                        candidate,
                    },
                )
                .await;
            }
        }
    }

    async fn on_disconnect(&mut self, id: ParticipantId) {
        if self.store.remove(&id).is_none() {
            debug!("Disconnect for unknown user {}", id);
            return;
        }
        info!("User disconnected: {}", id);

        self.broadcaster
            .broadcast(Some(id), ServerEvent::UserLeft(id))
            .await;
    }

    /// Mutations are bound to the channel they arrive on; a payload naming
    /// someone else is rejected.
    fn owns(&self, sender: ParticipantId, claimed: Option<ParticipantId>) -> bool {
        match claimed {
            Some(claimed) if claimed != sender => {
                warn!("User {} tried to update {}; ignored", sender, claimed);
                false
            }
            _ => true,
        }
    }

    async fn set_status(&mut self, id: ParticipantId, status: Status) {
        let Some(participant) = self.store.get_mut(&id) else {
            debug!("Status update for unknown user {}", id);
            return;
        };
        participant.status = status;
        debug!("Broadcasting {}'s status as {}", id, status);

        self.broadcaster
            .broadcast(None, ServerEvent::StatusUpdate { id, status })
            .await;
    }

    async fn forward(&self, target: ParticipantId, event: ServerEvent) {
        debug!("Forwarding {} to {}", event.name(), target);
        self.broadcaster.send_to(target, event).await;
    }
}
