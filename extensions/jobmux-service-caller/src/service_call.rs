use crate::JobCallerInterface;
use jobmux::envelope::Envelope;
use jobmux::rpc::JobError;
use jobmux_service::{ServiceMethod, UniqueMethod};

/// `M::call(&client, &request)` for any service method.
#[async_trait::async_trait]
pub trait ServiceCall: ServiceMethod + Sized + Send + Sync {
    async fn call<C: JobCallerInterface>(
        caller: &C,
        request: &Self::Request,
    ) -> Result<Envelope<Self::Response>, JobError>;
}

#[async_trait::async_trait]
impl<T> ServiceCall for T
where
    T: ServiceMethod + Send + Sync + 'static,
    T::Request: Sync,
{
    async fn call<C: JobCallerInterface>(
        caller: &C,
        request: &Self::Request,
    ) -> Result<Envelope<Self::Response>, JobError> {
        caller.call_service::<T>(request, &[]).await
    }
}

/// `M::call(&client, &request)` for any uniquely typed method.
#[async_trait::async_trait]
pub trait UniqueCall: UniqueMethod + Sized + Send + Sync {
    async fn call<C: JobCallerInterface>(
        caller: &C,
        request: &Self::Request,
    ) -> Result<Envelope<Self::Response>, JobError>;
}

#[async_trait::async_trait]
impl<T> UniqueCall for T
where
    T: UniqueMethod + Send + Sync + 'static,
    T::Request: Sync,
{
    async fn call<C: JobCallerInterface>(
        caller: &C,
        request: &Self::Request,
    ) -> Result<Envelope<Self::Response>, JobError> {
        caller.call_unique::<T>(request, &[]).await
    }
}
