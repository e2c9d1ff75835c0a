//! HTTP client for talking to a running relay server.

pub mod relay;

pub use relay::{RelayClient, RelayClientError};
