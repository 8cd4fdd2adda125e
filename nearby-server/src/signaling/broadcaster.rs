use async_trait::async_trait;
use nearby_core::{ParticipantId, ServerEvent};

/// Outbound side of the relay: how the relay reaches connected channels.
///
/// All sends are fire-and-forget. A target that has already gone away is
/// skipped without error.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn send_to(&self, participant_id: ParticipantId, event: ServerEvent);

    async fn broadcast(&self, except: Option<ParticipantId>, event: ServerEvent);

    /// Mark a channel as a broadcast recipient. Called by the relay once the
    /// channel has received its snapshot of the store.
    async fn admit(&self, participant_id: ParticipantId);
}
