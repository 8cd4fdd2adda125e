use nearby_core::{ParticipantId, Position, Status};

/// What a renderer needs to know to draw the space.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    ParticipantAdded {
        id: ParticipantId,
        position: Position,
        status: Status,
        is_local: bool,
    },
    ParticipantMoved {
        id: ParticipantId,
        position: Position,
    },
    ParticipantStatusChanged {
        id: ParticipantId,
        status: Status,
    },
    ParticipantRemoved {
        id: ParticipantId,
    },
    /// A call with `remote` is being set up.
    SessionStarted {
        remote: ParticipantId,
    },
    RemoteMedia {
        remote: ParticipantId,
        kind: String,
    },
    SessionConnected {
        remote: ParticipantId,
    },
    /// The call with `remote` ended; drop its media.
    MediaCleared {
        remote: ParticipantId,
    },
    SessionFailed {
        remote: ParticipantId,
        reason: String,
    },
}
