//! Anthropic Messages API client.
//!
//! Only the non-streaming, tool-free subset is used: one user turn made of
//! an image and an instruction, answered with text blocks.

mod client;
mod error;
mod types;

pub use client::ClaudeClient;
pub use error::ClaudeError;
pub use types::{ChatRequest, ChatResponse, ContentBlock, ImageSource, Message, StopReason, Usage};
