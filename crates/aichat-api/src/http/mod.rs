//! HTTP layer for the relay server.
//!
//! Axum router with `POST /api/chat` (streamed model output) and
//! `GET /health`, plus CORS and request tracing.

pub mod error;
pub mod handlers;
pub mod router;
