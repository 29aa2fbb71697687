use crate::constants::{
    INVALID_JOB_ID, JOB_ID_BOX_BITS, JOB_ID_PROCESS_BITS, JOB_ID_SEQUENCE_BITS,
    JOB_ID_START_TIME_BITS,
};
use std::fmt;

/// Opaque 64-bit correlation identifier linking a request to its response.
///
/// Bit layout, most significant first:
/// `[box id:10][process id:4][start time:30][sequence:20]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    /// Reserved "no job" value; never handed out by the allocator.
    pub const INVALID: JobId = JobId(INVALID_JOB_ID);

    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != INVALID_JOB_ID
    }

    pub const fn sequence(self) -> u64 {
        self.0 & ((1 << JOB_ID_SEQUENCE_BITS) - 1)
    }

    /// Seconds since 2005-01-01 UTC at which the issuing allocator started.
    pub const fn start_time(self) -> u64 {
        (self.0 >> JOB_ID_SEQUENCE_BITS) & ((1 << JOB_ID_START_TIME_BITS) - 1)
    }

    pub const fn process_id(self) -> u64 {
        (self.0 >> (JOB_ID_SEQUENCE_BITS + JOB_ID_START_TIME_BITS))
            & ((1 << JOB_ID_PROCESS_BITS) - 1)
    }

    pub const fn box_id(self) -> u64 {
        (self.0 >> (JOB_ID_SEQUENCE_BITS + JOB_ID_START_TIME_BITS + JOB_ID_PROCESS_BITS))
            & ((1 << JOB_ID_BOX_BITS) - 1)
    }
}

impl Default for JobId {
    fn default() -> Self {
        JobId::INVALID
    }
}

impl From<u64> for JobId {
    fn from(value: u64) -> Self {
        JobId(value)
    }
}

impl From<JobId> for u64 {
    fn from(job_id: JobId) -> Self {
        job_id.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("invalid")
        }
    }
}
