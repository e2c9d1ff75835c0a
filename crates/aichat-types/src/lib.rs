//! Shared domain types for AIChat.
//!
//! This crate contains the types exchanged between the client session,
//! the chat relay and the model provider: user profiles, chat messages and
//! attachments, LLM request/stream shapes, configuration, and error enums.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod profile;
