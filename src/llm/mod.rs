//! LLM-facing components: the completion backend trait and its HTTP
//! implementation.

pub mod chat_completions;

pub use chat_completions::{ChatCompletionsClient, CompletionBackend};
