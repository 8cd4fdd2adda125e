use nearby_core::{IceCandidate, ParticipantId, SessionDescription};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::MediaError;
use crate::session::media::{CaptureHandle, MediaBackend, MediaTransport, TransportEvent};

/// One incarnation of a session with a remote participant. Epochs are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub remote: ParticipantId,
    pub epoch: u64,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.remote, self.epoch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Offering,
    Answering,
    Connected,
}

pub(crate) enum SetupRole {
    Offer,
    Answer(SessionDescription),
}

pub(crate) struct Established<B: MediaBackend> {
    pub capture: B::Capture,
    pub transport: B::Transport,
    pub local: SessionDescription,
}

pub(crate) struct SetupCompletion<B: MediaBackend> {
    pub session: SessionKey,
    pub result: Result<Established<B>, MediaError>,
}

pub(crate) struct Session<B: MediaBackend> {
    pub key: SessionKey,
    pub phase: SessionPhase,
    cancel: CancellationToken,
    capture: Option<B::Capture>,
    transport: Option<B::Transport>,
    /// Remote candidates that arrived before the transport existed.
    remote_candidates: Vec<IceCandidate>,
    /// Local candidates generated before our description went out.
    local_candidates: Vec<IceCandidate>,
    description_sent: bool,
}

impl<B: MediaBackend> Session<B> {
    pub fn new(key: SessionKey, phase: SessionPhase) -> Self {
        Self {
            key,
            phase,
            cancel: CancellationToken::new(),
            capture: None,
            transport: None,
            remote_candidates: Vec::new(),
            local_candidates: Vec::new(),
            description_sent: false,
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn transport(&self) -> Option<&B::Transport> {
        self.transport.as_ref()
    }

    /// Take ownership of set-up handles; returns the remote candidates that
    /// were waiting for them.
    pub fn install(&mut self, capture: B::Capture, transport: B::Transport) -> Vec<IceCandidate> {
        self.capture = Some(capture);
        self.transport = Some(transport);
        std::mem::take(&mut self.remote_candidates)
    }

    pub fn buffer_remote_candidate(&mut self, candidate: IceCandidate) {
        self.remote_candidates.push(candidate);
    }

    /// Hold a local candidate back until our description is sent. Returns
    /// the candidate if it can go out right away.
    pub fn outgoing_candidate(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.description_sent {
            Some(candidate)
        } else {
            self.local_candidates.push(candidate);
            None
        }
    }

    /// Mark the description as sent and release held-back local candidates.
    pub fn description_sent(&mut self) -> Vec<IceCandidate> {
        self.description_sent = true;
        std::mem::take(&mut self.local_candidates)
    }

    pub async fn close(mut self) {
        self.cancel.cancel();
        release::<B>(self.capture.take(), self.transport.take()).await;
        debug!("Session {} released", self.key);
    }
}

pub(crate) async fn release<B: MediaBackend>(
    capture: Option<B::Capture>,
    transport: Option<B::Transport>,
) {
    if let Some(transport) = transport {
        transport.close().await;
    }
    if let Some(capture) = capture {
        capture.stop();
    }
}

/// Acquire capture, open the transport and produce the local description.
/// Whatever was acquired is released again on failure or cancellation.
pub(crate) async fn establish<B: MediaBackend>(
    backend: Arc<B>,
    session: SessionKey,
    role: SetupRole,
    events: mpsc::UnboundedSender<TransportEvent>,
    cancel: CancellationToken,
) -> Result<Established<B>, MediaError> {
    let capture = tokio::select! {
        _ = cancel.cancelled() => return Err(MediaError::Cancelled),
        capture = backend.acquire_capture() => capture?,
    };

    // Opening runs to completion so every transport is closed through `release`.
    let transport = match backend.open_transport(session, &capture, events).await {
        Ok(transport) => transport,
        Err(e) => {
            capture.stop();
            return Err(e);
        }
    };
    if cancel.is_cancelled() {
        release::<B>(Some(capture), Some(transport)).await;
        return Err(MediaError::Cancelled);
    }

    let local = match role {
        SetupRole::Offer => transport.create_offer().await,
        SetupRole::Answer(offer) => transport.accept_offer(offer).await,
    };

    match local {
        Ok(local) if !cancel.is_cancelled() => Ok(Established {
            capture,
            transport,
            local,
        }),
        Ok(_) => {
            release::<B>(Some(capture), Some(transport)).await;
            Err(MediaError::Cancelled)
        }
        Err(e) => {
            release::<B>(Some(capture), Some(transport)).await;
            Err(e)
        }
    }
}
