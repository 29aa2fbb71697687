use crate::envelope::{BodyContract, Envelope, InboundEnvelope};
use crate::rpc::JobError;
use futures::channel::oneshot;

/// Completion callback stored with a pending job.
///
/// It receives the raw inbound envelope and decodes the body with the
/// contract captured when the job was issued, so the registry never needs to
/// know body types.
pub type JobSink = Box<dyn FnOnce(Result<InboundEnvelope, JobError>) + Send>;

/// Builds a sink that decodes the response as `B` and forwards the outcome.
pub fn decoding_sink<B>(tx: oneshot::Sender<Result<Envelope<B>, JobError>>) -> JobSink
where
    B: BodyContract + Send + 'static,
{
    Box::new(move |outcome| {
        let decoded = outcome.and_then(|envelope| envelope.decode::<B>().map_err(JobError::from));

        if let Err(decoded) = tx.send(decoded) {
            tracing::trace!(
                "Job outcome dropped, nobody is waiting (ok: {})",
                decoded.is_ok()
            );
        }
    })
}
