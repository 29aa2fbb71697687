use crate::job::JobId;
use crate::rpc::JobError;
use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future over the outcome of a single issued job.
///
/// Completed exactly once: with the decoded response, or with
/// [`JobError::TimedOut`], [`JobError::Cancelled`] or
/// [`JobError::Disconnected`]. If the completing side goes away without
/// answering, the job reads as cancelled.
#[derive(Debug)]
pub struct AsyncJob<T> {
    job_id: JobId,
    rx: oneshot::Receiver<Result<T, JobError>>,
}

impl<T> AsyncJob<T> {
    /// Creates a job future and the sender that completes it.
    pub fn channel(job_id: JobId) -> (oneshot::Sender<Result<T, JobError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { job_id, rx })
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Takes the outcome if it has already arrived, without waiting.
    pub fn try_take(&mut self) -> Option<Result<T, JobError>> {
        match self.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::Canceled) => Some(Err(JobError::Cancelled)),
        }
    }
}

impl<T> Future for AsyncJob<T> {
    type Output = Result<T, JobError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(JobError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}
