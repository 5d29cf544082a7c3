//! Typed application errors and their JSON wire format.

pub mod types;

pub use types::{AppError, AppResult, ErrorEnvelope, ErrorKind};
