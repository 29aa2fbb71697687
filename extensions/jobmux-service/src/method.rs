use jobmux::envelope::{BodyContract, Envelope, MessageType};
use jobmux::job::JobKind;
use jobmux::rpc::{IssuedJob, JobError, JobSession};

/// A call addressed by job name and answered by the generic service-method
/// response.
///
/// Every method sharing a response contract should share a `KIND`; by default
/// each method gets its own, derived from its job name.
pub trait ServiceMethod {
    /// `Service.Method#Version`, see [`service_job_name!`](crate::service_job_name).
    const JOB_NAME: &'static str;

    const KIND: JobKind = JobKind::new(Self::JOB_NAME);

    type Request: BodyContract;
    type Response: BodyContract + Send + 'static;

    /// Encodes `request` and registers the pending job with `session`.
    fn issue(
        session: &JobSession,
        request: &Self::Request,
        payload: &[u8],
    ) -> Result<IssuedJob<Envelope<Self::Response>>, JobError> {
        session.issue_service_call::<Self::Request, Self::Response>(
            Self::KIND,
            Self::JOB_NAME,
            request,
            payload,
        )
    }
}

/// A call whose request and response each have a message type of their own.
pub trait UniqueMethod {
    const REQUEST_TYPE: MessageType;
    const RESPONSE_TYPE: MessageType;
    const KIND: JobKind;

    type Request: BodyContract;
    type Response: BodyContract + Send + 'static;

    fn issue(
        session: &JobSession,
        request: &Self::Request,
        payload: &[u8],
    ) -> Result<IssuedJob<Envelope<Self::Response>>, JobError> {
        session.issue_unique_call::<Self::Request, Self::Response>(
            Self::REQUEST_TYPE,
            Self::KIND,
            request,
            payload,
        )
    }
}
