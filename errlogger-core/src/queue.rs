//! Ordered store of undelivered error records
//!
//! Records are keyed by a monotonically increasing index. Two cursors track
//! the queue: `next_index` is the index the next accepted error receives and
//! `head_index` is the oldest undelivered record. Removal always moves the
//! head to the next record that is actually present, so [`DeliveryQueue::read`]
//! never lands on a hole.

use std::collections::BTreeMap;
use tracing::debug;

use crate::filter::ErrorFilter;
use crate::record::{CapturedError, ErrorRecord, RecordEnvelope};

#[derive(Debug)]
pub struct DeliveryQueue {
    filter: ErrorFilter,
    envelope: RecordEnvelope,
    records: BTreeMap<u64, ErrorRecord>,
    next_index: u64,
    head_index: u64,
}

impl DeliveryQueue {
    pub fn new(envelope: RecordEnvelope) -> Self {
        Self {
            filter: ErrorFilter::new(),
            envelope,
            records: BTreeMap::new(),
            next_index: 0,
            head_index: 0,
        }
    }

    /// Filter and store a captured error, returning the index it was assigned
    pub fn write(&mut self, captured: CapturedError) -> Option<u64> {
        if !self.filter.accept(&captured) {
            debug!(message = ?captured.message, "Ignoring opaque cross-origin error");
            return None;
        }

        let index = self.next_index;
        let record = self.envelope.build(index, captured);
        self.records.insert(index, record);
        self.next_index += 1;
        Some(index)
    }

    /// The head record, if any
    pub fn read(&self) -> Option<&ErrorRecord> {
        self.records.get(&self.head_index)
    }

    /// Remove the record at `index`. Returns false if there was nothing to remove.
    pub fn remove(&mut self, index: u64) -> bool {
        if self.records.remove(&index).is_none() {
            return false;
        }
        self.advance_head();
        true
    }

    /// Drop the oldest records that are not `in_flight` until at most `max_len` remain
    pub fn evict_overflow(&mut self, max_len: usize, in_flight: Option<u64>) -> Vec<u64> {
        let mut evicted = Vec::new();
        while self.records.len() > max_len {
            let victim = self
                .records
                .keys()
                .copied()
                .find(|index| Some(*index) != in_flight);

            match victim {
                Some(index) => {
                    self.records.remove(&index);
                    evicted.push(index);
                }
                None => break,
            }
        }

        if !evicted.is_empty() {
            self.advance_head();
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn head_index(&self) -> u64 {
        self.head_index
    }

    /// Indices of all pending records in ascending order
    pub fn pending(&self) -> Vec<u64> {
        self.records.keys().copied().collect()
    }

    fn advance_head(&mut self) {
        self.head_index = self
            .records
            .range(self.head_index..)
            .next()
            .map(|(index, _)| *index)
            .unwrap_or(self.next_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn queue() -> DeliveryQueue {
        DeliveryQueue::new(RecordEnvelope::new("test-app", BTreeMap::new()))
    }

    #[test]
    fn test_write_assigns_sequential_indices() {
        let mut queue = queue();
        assert_eq!(queue.write(CapturedError::new("first")), Some(0));
        assert_eq!(queue.write(CapturedError::new("second")), Some(1));
        assert_eq!(queue.next_index(), 2);
        assert_eq!(queue.read().map(ErrorRecord::index), Some(0));
    }

    #[test]
    fn test_filtered_write_consumes_no_index() {
        let mut queue = queue();
        assert_eq!(queue.write(CapturedError::new("Script error.")), None);
        assert!(queue.is_empty());
        assert_eq!(queue.next_index(), 0);
        assert!(queue.read().is_none());
    }

    #[test]
    fn test_remove_advances_head() {
        let mut queue = queue();
        queue.write(CapturedError::new("first"));
        queue.write(CapturedError::new("second"));

        assert!(queue.remove(0));
        assert_eq!(queue.head_index(), 1);
        assert_eq!(
            queue.read().and_then(|r| r.captured().message.clone()),
            Some("second".to_string())
        );

        assert!(queue.remove(1));
        assert_eq!(queue.head_index(), 2);
        assert!(queue.read().is_none());
    }

    #[test]
    fn test_remove_missing_index_is_noop() {
        let mut queue = queue();
        queue.write(CapturedError::new("only"));

        assert!(!queue.remove(5));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.head_index(), 0);
        assert_eq!(queue.next_index(), 1);
    }

    #[test]
    fn test_duplicate_remove_is_noop() {
        let mut queue = queue();
        queue.write(CapturedError::new("first"));
        queue.write(CapturedError::new("second"));

        assert!(queue.remove(0));
        assert!(!queue.remove(0));
        assert_eq!(queue.head_index(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_head_skips_holes() {
        let mut queue = queue();
        for i in 0..4 {
            queue.write(CapturedError::new(format!("error {}", i)));
        }

        // drop 1 and 2 while 0 is being sent
        let evicted = queue.evict_overflow(2, Some(0));
        assert_eq!(evicted, vec![1, 2]);
        assert_eq!(queue.head_index(), 0);

        assert!(queue.remove(0));
        assert_eq!(queue.head_index(), 3);
        assert_eq!(queue.read().map(ErrorRecord::index), Some(3));
    }

    #[test]
    fn test_evicting_idle_head_moves_head() {
        let mut queue = queue();
        for i in 0..3 {
            queue.write(CapturedError::new(format!("error {}", i)));
        }

        assert_eq!(queue.evict_overflow(1, None), vec![0, 1]);
        assert_eq!(queue.pending(), vec![2]);
        assert_eq!(queue.head_index(), 2);
    }

    #[test]
    fn test_head_never_moves_backwards() {
        let mut queue = queue();
        let mut last_head = queue.head_index();
        for i in 0..10 {
            queue.write(CapturedError::new(format!("error {}", i)));
            if i % 3 == 0 {
                let head = queue.head_index();
                queue.remove(head);
            }
            assert!(queue.head_index() >= last_head);
            last_head = queue.head_index();
        }
    }
}
