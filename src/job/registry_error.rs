use crate::job::{JobId, JobKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The job is already pending. The allocator never repeats an id, so this
    /// means its state has been corrupted.
    #[error("job {job_id} is already pending as {existing}")]
    DuplicateJob { job_id: JobId, existing: JobKind },

    #[error("cannot register the invalid job id")]
    InvalidJobId,
}
