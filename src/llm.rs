/// Text-generation client module.
///
/// This module provides a blocking client for OpenAI-compatible chat
/// completion APIs, the [`TextGenerator`] seam the tag pipeline depends on,
/// and the error type shared by both.
mod client;

pub use client::{LlmClient, LlmClientBuilder, LlmError, TextGenerator, parse_chat_completion};
