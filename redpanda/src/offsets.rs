//! Per-partition commit positions for out-of-order completion.
//!
//! Kafka commits one position per partition, and committing `n` acknowledges
//! every offset below it. With concurrent handling, messages finish out of
//! order, so the committable position is the lowest offset still in flight,
//! or one past the highest finished offset when nothing is in flight.

use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
struct PartitionOffsets {
    in_flight: BTreeSet<i64>,
    highest_done: Option<i64>,
    committed: Option<i64>,
}

/// Tracks in-flight offsets and yields positions that are safe to commit.
#[derive(Debug, Default)]
pub(crate) struct OffsetTracker {
    partitions: HashMap<(String, i32), PartitionOffsets>,
}

impl OffsetTracker {
    /// Record that `offset` has been received and is being handled.
    pub(crate) fn begin(&mut self, topic: &str, partition: i32, offset: i64) {
        self.partitions
            .entry((topic.to_string(), partition))
            .or_default()
            .in_flight
            .insert(offset);
    }

    /// Record that `offset` is done and return the position to commit, if it
    /// moved forward.
    pub(crate) fn complete(&mut self, topic: &str, partition: i32, offset: i64) -> Option<i64> {
        let state = self
            .partitions
            .entry((topic.to_string(), partition))
            .or_default();

        state.in_flight.remove(&offset);
        let highest_done = state.highest_done.map_or(offset, |done| done.max(offset));
        state.highest_done = Some(highest_done);

        let position = state
            .in_flight
            .first()
            .copied()
            .unwrap_or(highest_done + 1);

        if state.committed.is_some_and(|committed| committed >= position) {
            return None;
        }
        state.committed = Some(position);
        Some(position)
    }
}
