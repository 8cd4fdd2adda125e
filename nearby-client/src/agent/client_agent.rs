use nearby_core::{ClientEvent, Participant, ParticipantId, Position, ServerEvent, Status};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::agent::agent_command::{AgentCommand, AgentHandle};
use crate::agent::view_event::ViewEvent;
use crate::config::AgentConfig;
use crate::error::ConfigError;
use crate::presence::{ActivityMonitor, Admission, PresenceMirror};
use crate::proximity::{ProximityDetector, ProximityTrigger};
use crate::session::{MediaBackend, SessionInbox, SignalingAgent};

pub struct ClientAgent<B: MediaBackend> {
    config: AgentConfig,
    mirror: PresenceMirror,
    activity: ActivityMonitor,
    proximity: ProximityDetector,
    signaling: SignalingAgent<B>,
    inbox: SessionInbox<B>,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    view: mpsc::UnboundedSender<ViewEvent>,
    commands: mpsc::UnboundedReceiver<AgentCommand>,
}

impl<B: MediaBackend> ClientAgent<B> {
    /// Build an agent that writes relay events to `outbound`. Returns the
    /// agent, a handle for local input, and the renderer's event queue.
    pub fn new(
        config: AgentConfig,
        backend: Arc<B>,
        outbound: mpsc::UnboundedSender<ClientEvent>,
    ) -> Result<(Self, AgentHandle, mpsc::UnboundedReceiver<ViewEvent>), ConfigError> {
        config.validate()?;

        let (view_tx, view_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (signaling, inbox) = SignalingAgent::new(backend, outbound.clone(), view_tx.clone());

        let agent = Self {
            mirror: PresenceMirror::new(
                config.pending_position_ttl,
                config.pending_position_capacity,
            ),
            activity: ActivityMonitor::new(config.idle_timeout, Instant::now()),
            proximity: ProximityDetector::new(config.proximity),
            signaling,
            inbox,
            outbound,
            view: view_tx,
            commands: cmd_rx,
            config,
        };
        Ok((agent, AgentHandle::new(cmd_tx), view_rx))
    }

    /// Run until the relay link closes or a shutdown command arrives, then
    /// tear down every session.
    pub async fn run(mut self, mut server_events: mpsc::UnboundedReceiver<ServerEvent>) {
        info!("Client agent started");
        self.send(ClientEvent::UpdateStatus {
            status: Status::Online,
        });

        let mut idle_check = tokio::time::interval(self.config.idle_check_interval);
        idle_check.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = server_events.recv() => match event {
                    Some(event) => self.on_server_event(event).await,
                    None => {
                        info!("Relay link closed");
                        break;
                    }
                },

                command = self.commands.recv() => match command {
                    Some(AgentCommand::Shutdown) | None => {
                        info!("Client agent shutting down");
                        break;
                    }
                    Some(command) => self.on_command(command).await,
                },

                Some(event) = self.inbox.transport_rx.recv() => {
                    self.signaling.on_transport_event(event).await;
                }

                Some(completion) = self.inbox.setup_rx.recv() => {
                    self.signaling.on_setup_complete(completion).await;
                }

                _ = idle_check.tick() => {
                    if let Some(status) = self.activity.tick(Instant::now()) {
                        debug!("No activity for {:?}", self.config.idle_timeout);
                        self.send(ClientEvent::UpdateStatus { status });
                    }
                }
            }
        }

        self.signaling.shutdown().await;
        info!("Client agent stopped");
    }

    pub fn local_id(&self) -> Option<ParticipantId> {
        self.mirror.local_id()
    }

    pub fn mirror(&self) -> &PresenceMirror {
        &self.mirror
    }

    pub fn signaling(&self) -> &SignalingAgent<B> {
        &self.signaling
    }

    pub async fn on_server_event(&mut self, event: ServerEvent) {
        let now = Instant::now();

        match event {
            ServerEvent::Welcome { id } => {
                info!("Joined as {}", id);
                let entry = self.mirror.welcome(id, now);
                self.signaling.set_local_id(id);
                self.notify(ViewEvent::ParticipantAdded {
                    id,
                    position: entry.position,
                    status: entry.status,
                    is_local: true,
                });

                let others: Vec<_> = self.mirror.others().map(|(id, _)| id).collect();
                for other in others {
                    self.evaluate(other).await;
                }
            }

            ServerEvent::ExistingUsers(participants) => {
                debug!("Relay lists {} participant(s)", participants.len());
                for participant in participants {
                    self.admit(&participant, now).await;
                }
            }

            ServerEvent::UserJoined(participant) => {
                if !self.admit(&participant, now).await {
                    warn!("Participant {} already known; skipped", participant.id);
                }
            }

            ServerEvent::UpdatePosition { id, x, y } => {
                if Some(id) == self.mirror.local_id() {
                    return;
                }
                let position = Position::new(x, y);
                if self.mirror.update_position(id, position, now) {
                    self.notify(ViewEvent::ParticipantMoved { id, position });
                    self.evaluate(id).await;
                }
            }

            ServerEvent::UserLeft(id) => {
                self.signaling.stop(id).await;
                if self.mirror.remove(&id).is_some() {
                    info!("Participant {} left", id);
                    self.notify(ViewEvent::ParticipantRemoved { id });
                } else {
                    warn!("Participant {} left but was never known", id);
                }
            }

            ServerEvent::StatusUpdate { id, status } => {
                if self.mirror.update_status(id, status) {
                    debug!("{} is now {}", id, status);
                    self.notify(ViewEvent::ParticipantStatusChanged { id, status });
                }
            }

            ServerEvent::Offer { sender_id, offer } => {
                self.signaling.on_offer(sender_id, offer).await;
            }

            ServerEvent::Answer { sender_id, answer } => {
                self.signaling.on_answer(sender_id, answer).await;
            }

            ServerEvent::IceCandidate {
                sender_id,
                candidate,
            } => {
                self.signaling.on_ice_candidate(sender_id, candidate).await;
            }
        }
    }

    pub async fn on_command(&mut self, command: AgentCommand) {
        let now = Instant::now();

        match command {
            AgentCommand::MoveTo { x, y } => {
                if !(x.is_finite() && y.is_finite()) {
                    warn!("Move to non-finite position ({}, {}); ignored", x, y);
                    return;
                }
                self.record_activity(now);
                self.move_to(Position::new(x, y)).await;
            }
            AgentCommand::Activity => self.record_activity(now),
            AgentCommand::VisibilityChanged { visible } => {
                if let Some(status) = self.activity.set_visible(visible) {
                    self.send(ClientEvent::UpdateStatus { status });
                }
            }
            AgentCommand::Shutdown => {}
        }
    }

    async fn move_to(&mut self, target: Position) {
        let Some(id) = self.mirror.local_id() else {
            warn!("Move before the relay assigned an id; ignored");
            return;
        };
        let position = self.config.canvas.clamp(target);
        self.mirror.update_position(id, position, Instant::now());

        self.send(ClientEvent::UpdatePosition {
            id: Some(id),
            x: position.x,
            y: position.y,
        });
        self.notify(ViewEvent::ParticipantMoved { id, position });

        let others: Vec<_> = self.mirror.others().map(|(id, _)| id).collect();
        for other in others {
            self.evaluate(other).await;
        }
    }

    /// Returns false if the participant was already known.
    async fn admit(&mut self, participant: &Participant, now: Instant) -> bool {
        match self.mirror.admit(participant, now) {
            Admission::Created(entry) => {
                debug!("Participant {} added", participant.id);
                self.notify(ViewEvent::ParticipantAdded {
                    id: participant.id,
                    position: entry.position,
                    status: entry.status,
                    is_local: false,
                });
                self.evaluate(participant.id).await;
                true
            }
            Admission::Local => true,
            Admission::Duplicate => false,
        }
    }

    async fn evaluate(&mut self, remote: ParticipantId) {
        let (Some(local), Some(entry)) = (self.mirror.local_position(), self.mirror.get(&remote))
        else {
            return;
        };
        if Some(remote) == self.mirror.local_id() {
            return;
        }

        let in_session = self.signaling.has_session(&remote);
        match self.proximity.evaluate(local, entry.position, in_session) {
            Some(ProximityTrigger::Start) => {
                self.signaling.start(remote);
            }
            Some(ProximityTrigger::Stop) => {
                self.signaling.stop(remote).await;
            }
            None => {}
        }
    }

    fn record_activity(&mut self, now: Instant) {
        if let Some(status) = self.activity.record_activity(now) {
            self.send(ClientEvent::UpdateStatus { status });
        }
    }

    fn send(&self, event: ClientEvent) {
        if self.outbound.send(event).is_err() {
            debug!("Relay link closed; event dropped");
        }
    }

    fn notify(&self, event: ViewEvent) {
        let _ = self.view.send(event);
    }
}
