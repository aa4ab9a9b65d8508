use std::collections::{HashMap, HashSet};
use std::time::Instant;

use super::entity::{EntityId, EntityKind, RawSnapshot};

/// Last successful observation of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub snapshot: RawSnapshot,
    pub observed_at: Instant,
    /// System-wide total CPU ticks at the moment this record was taken.
    /// Lets a process delta be normalized against the matching system delta
    /// even when the process skipped a tick.
    pub reference_ticks: Option<u64>,
}

impl SampleRecord {
    pub fn new(snapshot: RawSnapshot, observed_at: Instant) -> Self {
        Self {
            snapshot,
            observed_at,
            reference_ticks: None,
        }
    }

    pub fn with_reference_ticks(mut self, ticks: u64) -> Self {
        self.reference_ticks = Some(ticks);
        self
    }
}

/// Previous-sample memory for every entity, replace-on-write.
#[derive(Debug, Default)]
pub struct CounterStore {
    entries: HashMap<EntityId, SampleRecord>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` and hands back whatever it replaced.
    pub fn observe(&mut self, id: EntityId, record: SampleRecord) -> Option<SampleRecord> {
        self.entries.insert(id, record)
    }

    pub fn get(&self, id: &EntityId) -> Option<&SampleRecord> {
        self.entries.get(id)
    }

    pub fn evict(&mut self, id: &EntityId) -> Option<SampleRecord> {
        self.entries.remove(id)
    }

    /// Drops every entity of `kind` that was not seen during the last poll
    /// cycle. Returns the evicted identities.
    pub fn retain_seen(&mut self, kind: EntityKind, seen: &HashSet<EntityId>) -> Vec<EntityId> {
        let gone: Vec<EntityId> = self
            .entries
            .keys()
            .filter(|id| id.kind() == kind && !seen.contains(*id))
            .cloned()
            .collect();
        for id in &gone {
            self.entries.remove(id);
        }
        gone
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
