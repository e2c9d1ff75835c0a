//! LLM provider abstractions for AIChat.
//!
//! - `LlmProvider`: object-safe trait for concrete provider implementations
//! - `CredentialSource` / `ProviderFactory`: how the relay obtains a
//!   provider for each request

pub mod credentials;
pub mod provider;

pub use credentials::{CredentialSource, ProviderFactory};
pub use provider::{BoxLlmProvider, LlmProvider, LlmStream};
