use crate::WithDispatcher;
use jobmux::envelope::{BodyContract, Envelope, MessageType};
use jobmux::job::JobId;
use jobmux::rpc::{AsyncJob, IssuedJob, JobError, JobSession};
use jobmux_service::{MethodRoutes, ServiceMethod, UniqueMethod};
use std::sync::Arc;

/// Defines a generic capability for issuing jobs.
///
/// Anything that can provide a [`JobSession`], the dispatcher answering its
/// jobs and an emit function for outbound bytes gets the call methods below.
#[async_trait::async_trait]
pub trait JobCallerInterface: Send + Sync {
    type DispatcherLock: WithDispatcher;

    // --- METHODS TO BE IMPLEMENTED BY THE STRUCT (e.g., JobClient) ---

    fn get_session(&self) -> Arc<JobSession>;

    fn get_dispatcher(&self) -> Arc<Self::DispatcherLock>;

    /// Hands encoded envelopes to the transport.
    fn get_emit_fn(&self) -> Arc<dyn Fn(Vec<u8>) + Send + Sync>;

    fn is_connected(&self) -> bool {
        true
    }

    // --- METHODS PROVIDED AUTOMATICALLY BY THE TRAIT ---

    /// Routes, issues and sends a service-method call without waiting for
    /// the response.
    async fn start_service_call<M>(
        &self,
        request: &M::Request,
        payload: &[u8],
    ) -> Result<AsyncJob<Envelope<M::Response>>, JobError>
    where
        M: ServiceMethod + 'static,
        M::Request: Sync,
    {
        self.get_dispatcher()
            .with_dispatcher(|dispatcher| dispatcher.route_service_method::<M>())
            .await;

        let issued = M::issue(&self.get_session(), request, payload)?;
        self.send_issued(issued)
    }

    async fn call_service<M>(
        &self,
        request: &M::Request,
        payload: &[u8],
    ) -> Result<Envelope<M::Response>, JobError>
    where
        M: ServiceMethod + 'static,
        M::Request: Sync,
    {
        self.start_service_call::<M>(request, payload).await?.await
    }

    async fn start_unique_call<M>(
        &self,
        request: &M::Request,
        payload: &[u8],
    ) -> Result<AsyncJob<Envelope<M::Response>>, JobError>
    where
        M: UniqueMethod + 'static,
        M::Request: Sync,
    {
        self.get_dispatcher()
            .with_dispatcher(|dispatcher| dispatcher.route_unique_method::<M>())
            .await;

        let issued = M::issue(&self.get_session(), request, payload)?;
        self.send_issued(issued)
    }

    async fn call_unique<M>(
        &self,
        request: &M::Request,
        payload: &[u8],
    ) -> Result<Envelope<M::Response>, JobError>
    where
        M: UniqueMethod + 'static,
        M::Request: Sync,
    {
        self.start_unique_call::<M>(request, payload).await?.await
    }

    /// Sends a message that expects no response.
    fn send_message<B>(
        &self,
        msg_type: MessageType,
        body: &B,
        payload: &[u8],
    ) -> Result<(), JobError>
    where
        B: BodyContract,
    {
        if !self.is_connected() {
            return Err(JobError::Disconnected);
        }

        let bytes = self.get_session().encode_message(msg_type, body, payload)?;
        (self.get_emit_fn())(bytes);
        Ok(())
    }

    fn cancel_job(&self, job_id: JobId) -> bool {
        self.get_session().cancel(job_id)
    }

    /// Emits an issued job's bytes and returns its future.
    ///
    /// A job issued while the connection is down is rejected here rather than
    /// left pending with nobody to answer it.
    fn send_issued<T>(&self, issued: IssuedJob<T>) -> Result<AsyncJob<T>, JobError> {
        let IssuedJob { bytes, async_job } = issued;

        if !self.is_connected() {
            self.get_session()
                .reject(async_job.job_id(), JobError::Disconnected);
            return Err(JobError::Disconnected);
        }

        (self.get_emit_fn())(bytes);
        Ok(async_job)
    }
}
