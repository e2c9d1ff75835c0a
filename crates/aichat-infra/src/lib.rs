//! Infrastructure layer for AIChat.
//!
//! Contains implementations of the ports defined in `aichat-core`: the
//! Gemini streaming provider, the environment credential source, the
//! JSON-file session store, plus the config loader, filesystem helpers and
//! the HTTP client the terminal uses to reach the relay.

pub mod client;
pub mod config;
pub mod filesystem;
pub mod llm;
pub mod secret;
pub mod session;
