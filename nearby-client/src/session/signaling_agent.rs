use nearby_core::{ClientEvent, Frame, IceCandidate, ParticipantId, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::agent::ViewEvent;
use crate::error::MediaError;
use crate::session::media::{MediaBackend, MediaTransport, TransportEvent};
use crate::session::session::{
    Established, Session, SessionKey, SessionPhase, SetupCompletion, SetupRole, establish, release,
};

pub(crate) struct SessionInbox<B: MediaBackend> {
    pub transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    pub setup_rx: mpsc::UnboundedReceiver<SetupCompletion<B>>,
}

/// Owns one session per nearby remote participant and drives the
/// offer/answer/candidate handshake for each.
pub struct SignalingAgent<B: MediaBackend> {
    backend: Arc<B>,
    local_id: Option<ParticipantId>,
    sessions: HashMap<ParticipantId, Session<B>>,
    next_epoch: u64,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    view: mpsc::UnboundedSender<ViewEvent>,
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    setup_tx: mpsc::UnboundedSender<SetupCompletion<B>>,
}

impl<B: MediaBackend> SignalingAgent<B> {
    pub(crate) fn new(
        backend: Arc<B>,
        outbound: mpsc::UnboundedSender<ClientEvent>,
        view: mpsc::UnboundedSender<ViewEvent>,
    ) -> (Self, SessionInbox<B>) {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (setup_tx, setup_rx) = mpsc::unbounded_channel();

        let agent = Self {
            backend,
            local_id: None,
            sessions: HashMap::new(),
            next_epoch: 0,
            outbound,
            view,
            transport_tx,
            setup_tx,
        };
        (agent, SessionInbox {
            transport_rx,
            setup_rx,
        })
    }

    /// Our own id, used to break offer glare.
    pub fn set_local_id(&mut self, id: ParticipantId) {
        self.local_id = Some(id);
    }

    pub fn has_session(&self, remote: &ParticipantId) -> bool {
        self.sessions.contains_key(remote)
    }

    pub fn phase(&self, remote: &ParticipantId) -> Option<SessionPhase> {
        self.sessions.get(remote).map(|s| s.phase)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Call `remote`. No-op if a session already exists.
    pub fn start(&mut self, remote: ParticipantId) -> bool {
        if self.has_session(&remote) {
            return false;
        }
        info!("Starting video call with {}", remote);
        self.begin(remote, SessionPhase::Offering, SetupRole::Offer);
        true
    }

    pub async fn stop(&mut self, remote: ParticipantId) -> bool {
        let Some(session) = self.sessions.remove(&remote) else {
            return false;
        };
        info!("Stopping video call with {}", remote);
        session.close().await;
        self.notify(ViewEvent::MediaCleared { remote });
        true
    }

    pub async fn shutdown(&mut self) {
        let remotes: Vec<_> = self.sessions.keys().copied().collect();
        for remote in remotes {
            self.stop(remote).await;
        }
    }

    pub async fn on_offer(&mut self, sender: ParticipantId, offer: SessionDescription) {
        match self.phase(&sender) {
            Some(SessionPhase::Offering) => {
                let yields = self.local_id.is_some_and(|me| me > sender);
                if !yields {
                    info!("Offer glare with {}: keeping our own offer", sender);
                    return;
                }
                info!("Offer glare with {}: answering theirs", sender);
                self.stop(sender).await;
            }
            Some(phase) => {
                info!("Offer from {} while {:?}; replacing session", sender, phase);
                self.stop(sender).await;
            }
            None => {}
        }

        info!("Answering offer from {}", sender);
        self.begin(sender, SessionPhase::Answering, SetupRole::Answer(offer));
    }

    pub async fn on_answer(&mut self, sender: ParticipantId, answer: SessionDescription) {
        let Some(session) = self.sessions.get_mut(&sender) else {
            warn!("Answer from {} without a session; ignored", sender);
            return;
        };
        if session.phase != SessionPhase::Offering {
            warn!(
                "Answer from {} while {:?}; ignored",
                sender, session.phase
            );
            return;
        }
        let Some(transport) = session.transport() else {
            warn!("Answer from {} before our offer was ready; ignored", sender);
            return;
        };

        let result = transport.accept_answer(answer).await;
        match result {
            Ok(()) => {
                session.phase = SessionPhase::Connected;
                info!("Video call with {} connected", sender);
                self.notify(ViewEvent::SessionConnected { remote: sender });
            }
            Err(e) => self.fail(sender, e).await,
        }
    }

    pub async fn on_ice_candidate(&mut self, sender: ParticipantId, candidate: IceCandidate) {
        let Some(session) = self.sessions.get_mut(&sender) else {
            debug!("ICE candidate from {} without a session; ignored", sender);
            return;
        };
        let Some(transport) = session.transport() else {
            debug!("Buffering ICE candidate from {}", sender);
            session.buffer_remote_candidate(candidate);
            return;
        };
        if let Err(e) = transport.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate from {}: {}", sender, e);
        }
    }

    pub(crate) async fn on_setup_complete(&mut self, completion: SetupCompletion<B>) {
        let SetupCompletion {
            session: key,
            result,
        } = completion;

        let current = self
            .sessions
            .get(&key.remote)
            .is_some_and(|s| s.key == key);
        if !current {
            match result {
                Ok(established) => {
                    debug!("Releasing media from stale setup {}", key);
                    release::<B>(Some(established.capture), Some(established.transport)).await;
                }
                Err(e) => debug!("Stale setup {} ended: {}", key, e),
            }
            return;
        }

        let Established {
            capture,
            transport,
            local,
        } = match result {
            Ok(established) => established,
            Err(e) => {
                self.fail(key.remote, e).await;
                return;
            }
        };

        let Some(session) = self.sessions.get_mut(&key.remote) else {
            return;
        };
        let waiting = session.install(capture, transport);
        if let Some(transport) = session.transport() {
            for candidate in waiting {
                if let Err(e) = transport.add_ice_candidate(candidate).await {
                    warn!("Failed to add buffered ICE candidate for {}: {}", key, e);
                }
            }
        }

        let target_id = key.remote;
        let event = match session.phase {
            SessionPhase::Offering => ClientEvent::Offer {
                target_id,
                offer: local,
            },
            SessionPhase::Answering => {
                session.phase = SessionPhase::Connected;
                ClientEvent::Answer {
                    target_id,
                    answer: local,
                }
            }
            SessionPhase::Connected => {
                warn!("Setup finished for already connected session {}", key);
                return;
            }
        };
        let connected = session.phase == SessionPhase::Connected;
        let held = session.description_sent();

        self.send(event);
        for candidate in held {
            self.send(ClientEvent::IceCandidate {
                target_id,
                candidate,
            });
        }

        if connected {
            info!("Video call with {} connected", target_id);
            self.notify(ViewEvent::SessionConnected { remote: target_id });
        } else {
            debug!("Offer sent to {}", target_id);
        }
    }

    pub(crate) async fn on_transport_event(&mut self, event: TransportEvent) {
        let key = event.session();
        let Some(session) = self
            .sessions
            .get_mut(&key.remote)
            .filter(|s| s.key == key)
        else {
            debug!("Transport event for stale session {}; ignored", key);
            return;
        };

        match event {
            TransportEvent::CandidateGenerated { candidate, .. } => {
                if let Some(candidate) = session.outgoing_candidate(candidate) {
                    self.send(ClientEvent::IceCandidate {
                        target_id: key.remote,
                        candidate,
                    });
                }
            }
            TransportEvent::RemoteTrack { kind, .. } => {
                debug!("Remote {} track from {}", kind, key.remote);
                self.notify(ViewEvent::RemoteMedia {
                    remote: key.remote,
                    kind,
                });
            }
            TransportEvent::Disconnected { .. } => {
                info!("Media transport to {} disconnected", key.remote);
                self.stop(key.remote).await;
            }
        }
    }

    fn begin(&mut self, remote: ParticipantId, phase: SessionPhase, role: SetupRole) {
        self.next_epoch += 1;
        let key = SessionKey {
            remote,
            epoch: self.next_epoch,
        };
        let session = Session::<B>::new(key, phase);

        let backend = self.backend.clone();
        let events = self.transport_tx.clone();
        let cancel = session.cancel_token();
        let done = self.setup_tx.clone();
        tokio::spawn(async move {
            let result = establish(backend, key, role, events, cancel).await;
            if let Err(mpsc::error::SendError(completion)) = done.send(SetupCompletion {
                session: key,
                result,
            }) {
                if let Ok(established) = completion.result {
                    release::<B>(Some(established.capture), Some(established.transport)).await;
                }
            }
        });

        self.sessions.insert(remote, session);
        self.notify(ViewEvent::SessionStarted { remote });
    }

    async fn fail(&mut self, remote: ParticipantId, e: MediaError) {
        error!("Video call with {} failed: {}", remote, e);
        if let Some(session) = self.sessions.remove(&remote) {
            session.close().await;
        }
        self.notify(ViewEvent::SessionFailed {
            remote,
            reason: e.to_string(),
        });
    }

    fn send(&self, event: ClientEvent) {
        let name = event.name();
        if self.outbound.send(event).is_err() {
            debug!("Relay link closed; dropping {}", name);
        }
    }

    fn notify(&self, event: ViewEvent) {
        let _ = self.view.send(event);
    }
}
