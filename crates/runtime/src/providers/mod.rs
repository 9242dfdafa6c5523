//! Completion service adapters.
//!
//! Each provider implements [`CompletionBackend`](crate::model::CompletionBackend)
//! for its specific API.

mod openai;

pub use openai::{DEFAULT_TIMEOUT, OpenAiBackend, OpenAiBackendBuilder};
