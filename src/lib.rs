pub mod constants;
pub mod envelope;
pub mod job;
pub mod rpc;
pub mod utils;
