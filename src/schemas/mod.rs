//! Wire schemas for the chat API.

pub mod chat;

pub use chat::{ChatReply, SuccessResponse};
