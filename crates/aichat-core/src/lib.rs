//! Business logic and port definitions for AIChat.
//!
//! This crate defines the session gate, the chat relay, the client-side
//! conversation model and the traits the infrastructure layer implements
//! (session storage, model providers, credential sources). It depends only
//! on `aichat-types` -- never on `aichat-infra` or any network/IO crate.

pub mod attachment;
pub mod chat;
pub mod llm;
pub mod session;
