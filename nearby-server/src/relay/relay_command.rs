use nearby_core::{ClientEvent, Participant, ParticipantId};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum RelayCommand {
    Connect { participant_id: ParticipantId },

    Event {
        participant_id: ParticipantId,
        event: ClientEvent,
    },

    Disconnect { participant_id: ParticipantId },

    Snapshot {
        reply: oneshot::Sender<Vec<Participant>>,
    },
}
