//! Device roster: known peers in first-seen order, one record per id.
//!
//! Every mutating call hands back a [`RosterSnapshot`] of the whole roster. The caller forwards it
//! to the application layer unchanged, so the app always receives ground truth after each event.

use std::collections::HashMap;

use tracing::debug;

use crate::peer::{ConnectionState, PeerId, PeerRecord};

/// Full roster contents at one point in time, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RosterSnapshot(pub Vec<PeerRecord>);

impl RosterSnapshot {
    pub fn records(&self) -> &[PeerRecord] {
        &self.0
    }

    pub fn get(&self, id: &PeerId) -> Option<&PeerRecord> {
        self.0.iter().find(|r| &r.id == id)
    }
}

/// Single-writer peer table. Order list + map keyed by id.
#[derive(Debug, Default)]
pub struct Roster {
    order: Vec<PeerId>,
    records: HashMap<PeerId, PeerRecord>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record, or update only the state of an existing one. The stored name is never
    /// overwritten.
    #[must_use = "the snapshot must be sent to the application layer"]
    pub fn upsert(
        &mut self,
        id: &PeerId,
        name: Option<String>,
        state: ConnectionState,
    ) -> RosterSnapshot {
        match self.records.get_mut(id) {
            Some(record) => {
                debug!(peer = %id, from = ?record.state, to = ?state, "roster state update");
                record.state = state;
            }
            None => {
                debug!(peer = %id, ?state, "roster insert");
                self.order.push(id.clone());
                self.records
                    .insert(id.clone(), PeerRecord::new(id.clone(), name, state));
            }
        }
        self.snapshot()
    }

    /// Remove the record for `id` if present.
    #[must_use = "the snapshot must be sent to the application layer"]
    pub fn remove(&mut self, id: &PeerId) -> RosterSnapshot {
        if self.records.remove(id).is_some() {
            debug!(peer = %id, "roster remove");
            self.order.retain(|p| p != id);
        }
        self.snapshot()
    }

    pub fn exists(&self, id: &PeerId) -> bool {
        self.records.contains_key(id)
    }

    pub fn lookup(&self, id: &PeerId) -> Option<&PeerRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PeerRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot(self.iter().cloned().collect())
    }
}
