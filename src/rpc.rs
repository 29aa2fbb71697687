mod async_job;
mod job_dispatcher;
mod job_error;
mod job_session;
mod job_sink;

pub use async_job::AsyncJob;
pub use job_dispatcher::{DispatchOutcome, DispatchStats, HandlerResult, JobDispatcher, JobHandler};
pub use job_error::JobError;
pub use job_session::{IssuedJob, JobSession, SessionIdentity};
pub use job_sink::{JobSink, decoding_sink};
