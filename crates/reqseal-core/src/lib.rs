pub mod config;
pub mod error;
pub mod keys;
pub mod order;

pub use error::{ReqsealError, ReqsealResult};
