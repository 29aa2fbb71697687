pub mod constants;
pub use constants::*;
mod macros;
mod method;
pub use method::*;
mod routes;
pub use routes::*;
