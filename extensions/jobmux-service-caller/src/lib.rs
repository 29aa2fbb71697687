mod caller_interface;
pub use caller_interface::*;
mod service_call;
pub use service_call::*;
mod with_dispatcher_trait;
pub use with_dispatcher_trait::*;
