use crate::{
    constants::{
        INVALID_JOB_ID, JOB_ID_BOX_BITS, JOB_ID_COUNTER_MASK, JOB_ID_EPOCH_UNIX_SECS,
        JOB_ID_PROCESS_BITS, JOB_ID_SEQUENCE_BITS, JOB_ID_START_TIME_BITS,
    },
    job::JobId,
    utils::now,
};
use std::sync::atomic::{AtomicU64, Ordering};

/// Mints job identifiers for one connection or process.
///
/// The start time captured at construction is the epoch that keeps IDs of a
/// restarted process from colliding with stale in-flight responses. Start time
/// and sequence share one atomic counter, so a sequence overflow carries into
/// the start-time field instead of wrapping back to a used value.
#[derive(Debug)]
pub struct JobIdAllocator {
    prefix: u64,
    counter: AtomicU64,
}

impl JobIdAllocator {
    pub fn new() -> Self {
        Self::with_ids(0, 0)
    }

    /// Allocator stamping the given box and process identifiers. Values wider
    /// than their fields are truncated.
    pub fn with_ids(box_id: u16, process_id: u8) -> Self {
        let micros = now() as i64;
        let start_secs = (micros / 1_000_000 - JOB_ID_EPOCH_UNIX_SECS).max(0) as u64;
        Self::with_start_time(box_id, process_id, start_secs)
    }

    pub fn with_start_time(box_id: u16, process_id: u8, start_secs: u64) -> Self {
        let box_bits = (box_id as u64) & ((1 << JOB_ID_BOX_BITS) - 1);
        let process_bits = (process_id as u64) & ((1 << JOB_ID_PROCESS_BITS) - 1);
        let start_bits = start_secs & ((1 << JOB_ID_START_TIME_BITS) - 1);

        let process_shift = JOB_ID_SEQUENCE_BITS + JOB_ID_START_TIME_BITS;
        let box_shift = process_shift + JOB_ID_PROCESS_BITS;
        let prefix = (box_bits << box_shift) | (process_bits << process_shift);

        Self {
            prefix,
            counter: AtomicU64::new(start_bits << JOB_ID_SEQUENCE_BITS),
        }
    }

    /// Returns the next job identifier. Never blocks and never returns
    /// [`JobId::INVALID`].
    #[inline]
    pub fn next(&self) -> JobId {
        loop {
            let counter = self.counter.fetch_add(1, Ordering::Relaxed) & JOB_ID_COUNTER_MASK;
            let value = self.prefix | counter;
            if value != INVALID_JOB_ID {
                return JobId::new(value);
            }
        }
    }
}

impl Default for JobIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
