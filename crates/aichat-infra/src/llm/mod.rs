//! LLM provider implementations.
//!
//! Contains the concrete [`LlmProvider`](aichat_core::llm::LlmProvider)
//! implementation for Google Gemini and its per-request factory.

pub mod gemini;

pub use gemini::{GeminiProvider, GeminiProviderFactory};
