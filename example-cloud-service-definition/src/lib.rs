pub mod cloud;
pub mod ufs;
