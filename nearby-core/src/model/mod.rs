mod participant;
mod signaling;

pub use participant::{Participant, ParticipantId, Position, Status};
pub use signaling::{IceCandidate, IceServerConfig, SdpType, SessionDescription};
