mod job_id;
mod job_id_allocator;
mod job_kind;
mod pending_job_registry;
mod registry_error;

pub use job_id::JobId;
pub use job_id_allocator::JobIdAllocator;
pub use job_kind::JobKind;
pub use pending_job_registry::{EvictedJob, PendingJobRegistry};
pub use registry_error::RegistryError;
