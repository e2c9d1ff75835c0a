//! LlmProvider trait definition.
//!
//! The single abstraction every model backend implements. `stream` returns
//! a boxed stream so the trait stays object-safe and providers can be
//! chosen at runtime.

use std::pin::Pin;

use futures_util::Stream;

use aichat_types::llm::{CompletionRequest, LlmError, StreamEvent};

/// Stream of events produced by [`LlmProvider::stream`].
pub type LlmStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for LLM provider backends.
///
/// Implementations live in aichat-infra (e.g., `GeminiProvider`).
///
/// A well-behaved stream yields [`StreamEvent::Connected`] once the
/// provider has accepted the request, then text deltas, then `Done`.
/// Errors before `Connected` mean nothing was generated.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a streaming completion request. Returns a stream of events.
    fn stream(&self, request: CompletionRequest) -> LlmStream;
}

/// Type-erased LLM provider for runtime provider selection.
pub type BoxLlmProvider = Box<dyn LlmProvider>;
