//! Interactive terminal chat.
//!
//! Streams replies from a running relay, supports file attachments and
//! slash commands. Entry point: `loop_runner::run_chat_loop`.

pub mod commands;
pub mod input;
pub mod loop_runner;
