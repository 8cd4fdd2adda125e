use nearby_core::{Participant, ParticipantId, Position, Status};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorEntry {
    pub position: Position,
    pub status: Status,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// A new entry was created, possibly at a buffered position.
    Created(MirrorEntry),
    Duplicate,
    Local,
}

#[derive(Debug, Clone, Copy)]
struct PendingPosition {
    position: Position,
    received_at: Instant,
}

/// Positions for participants not known yet. Last write wins per id.
#[derive(Debug)]
struct PendingPositions {
    ttl: Duration,
    capacity: usize,
    updates: HashMap<ParticipantId, PendingPosition>,
}

impl PendingPositions {
    fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            updates: HashMap::new(),
        }
    }

    fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        let before = self.updates.len();
        self.updates
            .retain(|_, p| now.saturating_duration_since(p.received_at) < ttl);
        let expired = before - self.updates.len();
        if expired > 0 {
            debug!("Dropped {} expired pending position(s)", expired);
        }
    }

    fn push(&mut self, id: ParticipantId, position: Position, now: Instant) {
        self.prune(now);
        if self.capacity == 0 {
            return;
        }
        if !self.updates.contains_key(&id) && self.updates.len() >= self.capacity {
            let oldest = self
                .updates
                .iter()
                .min_by_key(|(_, p)| p.received_at)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                debug!("Pending position queue full; evicting {}", oldest);
                self.updates.remove(&oldest);
            }
        }
        self.updates.insert(
            id,
            PendingPosition {
                position,
                received_at: now,
            },
        );
    }

    fn take(&mut self, id: &ParticipantId, now: Instant) -> Option<Position> {
        self.prune(now);
        self.updates.remove(id).map(|p| p.position)
    }

    fn discard(&mut self, id: &ParticipantId) {
        self.updates.remove(id);
    }

    fn len(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.updates.len()
    }
}

#[derive(Debug)]
pub struct PresenceMirror {
    local_id: Option<ParticipantId>,
    entries: HashMap<ParticipantId, MirrorEntry>,
    pending: PendingPositions,
}

impl PresenceMirror {
    pub fn new(pending_ttl: Duration, pending_capacity: usize) -> Self {
        Self {
            local_id: None,
            entries: HashMap::new(),
            pending: PendingPositions::new(pending_ttl, pending_capacity),
        }
    }

    pub fn local_id(&self) -> Option<ParticipantId> {
        self.local_id
    }

    /// Record the id the relay assigned us and create our own entry.
    pub fn welcome(&mut self, id: ParticipantId, now: Instant) -> MirrorEntry {
        if let Some(previous) = self.local_id.replace(id).filter(|p| *p != id) {
            warn!("Local id changed from {} to {}", previous, id);
            self.entries.remove(&previous);
        }
        let position = self.pending.take(&id, now).unwrap_or_else(Position::spawn);
        let entry = MirrorEntry {
            position,
            status: Status::Online,
        };
        self.entries.insert(id, entry);
        entry
    }

    pub fn admit(&mut self, participant: &Participant, now: Instant) -> Admission {
        if Some(participant.id) == self.local_id {
            return Admission::Local;
        }
        if self.entries.contains_key(&participant.id) {
            return Admission::Duplicate;
        }

        let position = self
            .pending
            .take(&participant.id, now)
            .unwrap_or_else(|| participant.position());
        let entry = MirrorEntry {
            position,
            status: participant.status,
        };
        self.entries.insert(participant.id, entry);
        Admission::Created(entry)
    }

    /// Apply a position, buffering it if the participant is not known yet.
    /// Returns whether the position was applied.
    pub fn update_position(&mut self, id: ParticipantId, position: Position, now: Instant) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.position = position;
                true
            }
            None => {
                debug!("Buffering position for unknown participant {}", id);
                self.pending.push(id, position, now);
                false
            }
        }
    }

    pub fn update_status(&mut self, id: ParticipantId, status: Status) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &ParticipantId) -> Option<MirrorEntry> {
        self.pending.discard(id);
        self.entries.remove(id)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&MirrorEntry> {
        self.entries.get(id)
    }

    pub fn local_position(&self) -> Option<Position> {
        self.local_id
            .and_then(|id| self.entries.get(&id))
            .map(|e| e.position)
    }

    pub fn others(&self) -> impl Iterator<Item = (ParticipantId, &MirrorEntry)> + '_ {
        let local = self.local_id;
        self.entries
            .iter()
            .filter(move |(id, _)| Some(**id) != local)
            .map(|(id, e)| (*id, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_len(&mut self, now: Instant) -> usize {
        self.pending.len(now)
    }
}
