use crate::envelope::{
    BodyContract, Envelope, EnvelopeCodec, EnvelopeEncodeError, EnvelopeHeader, MessageType,
};
use crate::job::{JobId, JobIdAllocator, JobKind, PendingJobRegistry};
use crate::rpc::{AsyncJob, JobError, JobSink, decoding_sink};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Peer and session identifiers stamped into every outbound header. Supplied
/// by the session layer once the connection is logged on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    pub peer_id: u64,
    pub session_id: i32,
}

/// A job that has been encoded and registered but not yet sent.
///
/// `bytes` goes to the transport; `async_job` completes with the response.
#[derive(Debug)]
pub struct IssuedJob<T> {
    pub bytes: Vec<u8>,
    pub async_job: AsyncJob<T>,
}

impl<T> IssuedJob<T> {
    pub fn job_id(&self) -> JobId {
        self.async_job.job_id()
    }
}

/// Call-issuing side of a connection.
///
/// Mints job ids, stamps headers with the session identity, encodes the
/// request and registers the pending job with the registry it shares with the
/// [`JobDispatcher`](crate::rpc::JobDispatcher). Safe to use from any number
/// of tasks at once.
pub struct JobSession {
    allocator: JobIdAllocator,
    registry: Arc<PendingJobRegistry<JobSink>>,
    identity: RwLock<SessionIdentity>,
    job_timeout: Option<Duration>,
}

impl JobSession {
    pub fn new(registry: Arc<PendingJobRegistry<JobSink>>) -> Self {
        Self::with_allocator(JobIdAllocator::new(), registry)
    }

    pub fn with_allocator(
        allocator: JobIdAllocator,
        registry: Arc<PendingJobRegistry<JobSink>>,
    ) -> Self {
        Self {
            allocator,
            registry,
            identity: RwLock::new(SessionIdentity::default()),
            job_timeout: None,
        }
    }

    /// Jobs issued from now on expire after `timeout`; `None` lets them wait
    /// indefinitely.
    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout
    }

    pub fn registry(&self) -> &Arc<PendingJobRegistry<JobSink>> {
        &self.registry
    }

    pub fn identity(&self) -> SessionIdentity {
        *self.identity.read()
    }

    pub fn set_identity(&self, identity: SessionIdentity) {
        *self.identity.write() = identity;
    }

    pub fn next_job_id(&self) -> JobId {
        self.allocator.next()
    }

    /// A header for `msg_type` stamped with the current session identity.
    pub fn header(&self, msg_type: MessageType) -> EnvelopeHeader {
        let identity = self.identity();
        EnvelopeHeader {
            peer_id: identity.peer_id,
            session_id: identity.session_id,
            ..EnvelopeHeader::new(msg_type)
        }
    }

    /// Issues a service-method call named `job_name`, answered by the generic
    /// service-method response.
    pub fn issue_service_call<Req, Resp>(
        &self,
        kind: JobKind,
        job_name: &str,
        request: &Req,
        payload: &[u8],
    ) -> Result<IssuedJob<Envelope<Resp>>, JobError>
    where
        Req: BodyContract,
        Resp: BodyContract + Send + 'static,
    {
        let mut header = self.header(MessageType::ServiceMethod);
        header.target_job_name = Some(job_name.to_owned());
        self.issue(kind, header, request, payload)
    }

    /// Issues a call sent as `request_type` whose response has its own
    /// message type, bound to `kind` on the dispatcher.
    pub fn issue_unique_call<Req, Resp>(
        &self,
        request_type: MessageType,
        kind: JobKind,
        request: &Req,
        payload: &[u8],
    ) -> Result<IssuedJob<Envelope<Resp>>, JobError>
    where
        Req: BodyContract,
        Resp: BodyContract + Send + 'static,
    {
        self.issue(kind, self.header(request_type), request, payload)
    }

    /// Stamps `header` with a fresh source job id, encodes the request and
    /// registers the job under `kind`.
    ///
    /// Encoding happens first so that a rejected request never leaves a
    /// pending job behind.
    pub fn issue<Req, Resp>(
        &self,
        kind: JobKind,
        mut header: EnvelopeHeader,
        request: &Req,
        payload: &[u8],
    ) -> Result<IssuedJob<Envelope<Resp>>, JobError>
    where
        Req: BodyContract,
        Resp: BodyContract + Send + 'static,
    {
        let job_id = self.allocator.next();
        header.source_job_id = job_id;

        let bytes = EnvelopeCodec::encode_parts(&header, request, payload)?;

        let (tx, async_job) = AsyncJob::channel(job_id);
        let deadline = self.job_timeout.map(|timeout| Instant::now() + timeout);
        self.registry
            .register(kind, job_id, decoding_sink::<Resp>(tx), deadline)?;

        tracing::debug!(
            "Issued job {} as {} ({:?}, {} bytes)",
            job_id,
            kind,
            header.msg_type,
            bytes.len()
        );

        Ok(IssuedJob { bytes, async_job })
    }

    /// Encodes a message that expects no response.
    pub fn encode_message<B: BodyContract>(
        &self,
        msg_type: MessageType,
        body: &B,
        payload: &[u8],
    ) -> Result<Vec<u8>, EnvelopeEncodeError> {
        EnvelopeCodec::encode_parts(&self.header(msg_type), body, payload)
    }

    /// Encodes a reply to `request`, targeting the job that sent it.
    pub fn encode_reply<B: BodyContract>(
        &self,
        msg_type: MessageType,
        request: &EnvelopeHeader,
        body: &B,
        payload: &[u8],
    ) -> Result<Vec<u8>, EnvelopeEncodeError> {
        let header = EnvelopeHeader::reply_to(msg_type, request);
        EnvelopeCodec::encode_parts(&header, body, payload)
    }

    /// Withdraws a pending job and completes it with [`JobError::Cancelled`].
    ///
    /// Returns `false` if the job was not pending. A response arriving later
    /// is discarded as unmatched.
    pub fn cancel(&self, job_id: JobId) -> bool {
        self.reject(job_id, JobError::Cancelled)
    }

    /// Withdraws a pending job and completes it with `error`.
    pub fn reject(&self, job_id: JobId, error: JobError) -> bool {
        match self.registry.cancel(job_id) {
            Some((kind, sink)) => {
                tracing::debug!("Rejected job {} ({}): {}", job_id, kind, error);
                sink(Err(error));
                true
            }
            None => false,
        }
    }

    pub fn pending_jobs(&self) -> usize {
        self.registry.len()
    }
}
