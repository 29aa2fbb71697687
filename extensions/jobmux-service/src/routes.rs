use crate::{ServiceMethod, UniqueMethod};
use jobmux::rpc::JobDispatcher;

/// Registers the routes a method's responses need on a [`JobDispatcher`].
pub trait MethodRoutes {
    /// Makes `M`'s kind a candidate for generic service-method responses.
    /// Kinds are probed in the order they were routed.
    fn route_service_method<M: ServiceMethod>(&mut self);

    /// Binds `M`'s response message type to its kind.
    fn route_unique_method<M: UniqueMethod>(&mut self);
}

impl MethodRoutes for JobDispatcher {
    fn route_service_method<M: ServiceMethod>(&mut self) {
        self.register_service_kind(M::KIND);
    }

    fn route_unique_method<M: UniqueMethod>(&mut self) {
        if let Some(previous) = self.bind_response(M::RESPONSE_TYPE, M::KIND) {
            if previous != M::KIND {
                tracing::warn!(
                    "{:?} rebound from {} to {}",
                    M::RESPONSE_TYPE,
                    previous,
                    M::KIND
                );
            }
        }
    }
}
