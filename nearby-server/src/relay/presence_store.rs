use nearby_core::{Participant, ParticipantId};
use std::collections::HashMap;

/// Who is connected and where. Owned by the relay task, so implementations
/// need no interior locking.
pub trait PresenceStore: Send + Sync + 'static {
    /// Insert or replace a participant, returning the previous entry.
    fn insert(&mut self, participant: Participant) -> Option<Participant>;

    fn get(&self, participant_id: &ParticipantId) -> Option<&Participant>;

    fn get_mut(&mut self, participant_id: &ParticipantId) -> Option<&mut Participant>;

    fn remove(&mut self, participant_id: &ParticipantId) -> Option<Participant>;

    /// All participants, in no particular order.
    fn snapshot(&self) -> Vec<Participant>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.get(participant_id).is_some()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPresenceStore {
    participants: HashMap<ParticipantId, Participant>,
}

impl InMemoryPresenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresenceStore for InMemoryPresenceStore {
    fn insert(&mut self, participant: Participant) -> Option<Participant> {
        self.participants.insert(participant.id, participant)
    }

    fn get(&self, participant_id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(participant_id)
    }

    fn get_mut(&mut self, participant_id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(participant_id)
    }

    fn remove(&mut self, participant_id: &ParticipantId) -> Option<Participant> {
        self.participants.remove(participant_id)
    }

    fn snapshot(&self) -> Vec<Participant> {
        self.participants.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.participants.len()
    }
}
