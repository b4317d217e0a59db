//! Flow table keyed by the 4-tuple.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::info;

use crate::domain::{FlowKey, FlowRecord, TcpSegment};

/// All flows observed during one capture session.
///
/// The table has a single owner (the session coordinator); interface
/// loops never touch it directly.
#[derive(Debug, Default)]
pub struct FlowTable {
    flows: HashMap<FlowKey, FlowRecord>,
}

impl FlowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the record for `key`, creating it if this is a new flow.
    ///
    /// The boolean is true when the record was just created.
    pub fn lookup_or_create(&mut self, key: FlowKey, now: Instant) -> (&mut FlowRecord, bool) {
        match self.flows.entry(key) {
            Entry::Occupied(entry) => (entry.into_mut(), false),
            Entry::Vacant(entry) => (entry.insert(FlowRecord::started_at(key, now)), true),
        }
    }

    pub fn get(&self, key: &FlowKey) -> Option<&FlowRecord> {
        self.flows.get(key)
    }

    pub fn remove(&mut self, key: &FlowKey) -> Option<FlowRecord> {
        self.flows.remove(key)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Apply one segment to its flow.
    ///
    /// Returns the finished record, already removed from the table, when
    /// the segment closes the flow.
    pub fn ingest(&mut self, segment: TcpSegment, now: Instant) -> Option<FlowRecord> {
        let (record, is_new) = self.lookup_or_create(segment.key, now);
        if is_new {
            info!("New flow {}", segment.key);
        }

        record.touch(now);
        record.push_payload(&segment.payload);

        if !segment.closing {
            return None;
        }

        record.mark_finished();
        self.flows.remove(&segment.key)
    }

    /// Remove every flow with no segment for at least `idle_timeout`.
    ///
    /// Evicted records are returned oldest first.
    pub fn evict_idle(&mut self, now: Instant, idle_timeout: Duration) -> Vec<FlowRecord> {
        let idle: Vec<FlowKey> = self
            .flows
            .values()
            .filter(|record| now.saturating_duration_since(record.last_seen) >= idle_timeout)
            .map(|record| record.key)
            .collect();

        let mut evicted: Vec<FlowRecord> = idle
            .iter()
            .filter_map(|key| self.flows.remove(key))
            .collect();
        evicted.sort_by_key(|record| record.started_at);
        evicted
    }
}
