use async_trait::async_trait;
use nearby_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

use crate::error::MediaError;
use crate::session::SessionKey;

/// Events a transport raises on its own, tagged with the session it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    CandidateGenerated {
        session: SessionKey,
        candidate: IceCandidate,
    },
    /// Remote media arrived; `kind` is "audio" or "video".
    RemoteTrack { session: SessionKey, kind: String },
    Disconnected { session: SessionKey },
}

impl TransportEvent {
    pub fn session(&self) -> SessionKey {
        match self {
            Self::CandidateGenerated { session, .. }
            | Self::RemoteTrack { session, .. }
            | Self::Disconnected { session } => *session,
        }
    }
}

pub trait CaptureHandle: Send + Sync + 'static {
    fn stop(self);
}

#[async_trait]
pub trait MediaTransport: Send + Sync + 'static {
    /// Create an offer and set it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription, MediaError>;

    /// Apply a remote offer, then create and set the answer.
    async fn accept_offer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, MediaError>;

    async fn accept_answer(&self, answer: SessionDescription) -> Result<(), MediaError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError>;

    async fn close(&self);
}

#[async_trait]
pub trait MediaBackend: Send + Sync + 'static {
    type Capture: CaptureHandle;
    type Transport: MediaTransport;

    async fn acquire_capture(&self) -> Result<Self::Capture, MediaError>;

    /// Open a transport carrying `capture`'s tracks. Its events go to
    /// `events`, tagged with `session`.
    async fn open_transport(
        &self,
        session: SessionKey,
        capture: &Self::Capture,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Self::Transport, MediaError>;
}
