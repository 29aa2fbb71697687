mod job_client;
pub use job_client::{JobClient, JobClientConfig, MIN_SWEEP_INTERVAL};
