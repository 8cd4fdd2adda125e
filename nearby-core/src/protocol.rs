//! Relay wire protocol.
//!
//! Every frame is a JSON text frame of the form
//! `{"event": "<name>", "data": <payload>}`. Field names are camelCase so
//! browser clients can use the payloads as-is.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::ProtocolError;
use crate::model::{IceCandidate, Participant, ParticipantId, SessionDescription, Status};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Move the sender's avatar. `id`, when present, must be the sender's own id.
    UpdatePosition {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<ParticipantId>,
        x: f64,
        y: f64,
    },
    UpdateStatus {
        status: Status,
    },
    StatusChange {
        id: ParticipantId,
        status: Status,
    },
    Offer {
        target_id: ParticipantId,
        offer: SessionDescription,
    },
    Answer {
        target_id: ParticipantId,
        answer: SessionDescription,
    },
    IceCandidate {
        target_id: ParticipantId,
        candidate: IceCandidate,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// First frame on every channel: the id the relay assigned to it.
    Welcome {
        id: ParticipantId,
    },
    ExistingUsers(Vec<Participant>),
    UserJoined(Participant),
    UserLeft(ParticipantId),
    UpdatePosition {
        id: ParticipantId,
        x: f64,
        y: f64,
    },
    StatusUpdate {
        id: ParticipantId,
        status: Status,
    },
    Offer {
        sender_id: ParticipantId,
        offer: SessionDescription,
    },
    Answer {
        sender_id: ParticipantId,
        answer: SessionDescription,
    },
    IceCandidate {
        sender_id: ParticipantId,
        candidate: IceCandidate,
    },
}

pub trait Frame: Serialize + DeserializeOwned {
    fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }

    /// Event name as it appears on the wire, for logging.
    fn name(&self) -> &'static str;
}

impl Frame for ClientEvent {
    fn name(&self) -> &'static str {
        match self {
            ClientEvent::UpdatePosition { .. } => "updatePosition",
            ClientEvent::UpdateStatus { .. } => "updateStatus",
            ClientEvent::StatusChange { .. } => "statusChange",
            ClientEvent::Offer { .. } => "offer",
            ClientEvent::Answer { .. } => "answer",
            ClientEvent::IceCandidate { .. } => "iceCandidate",
        }
    }
}

impl Frame for ServerEvent {
    fn name(&self) -> &'static str {
        match self {
            ServerEvent::Welcome { .. } => "welcome",
            ServerEvent::ExistingUsers(_) => "existingUsers",
            ServerEvent::UserJoined(_) => "userJoined",
            ServerEvent::UserLeft(_) => "userLeft",
            ServerEvent::UpdatePosition { .. } => "updatePosition",
            ServerEvent::StatusUpdate { .. } => "statusUpdate",
            ServerEvent::Offer { .. } => "offer",
            ServerEvent::Answer { .. } => "answer",
            ServerEvent::IceCandidate { .. } => "iceCandidate",
        }
    }
}
