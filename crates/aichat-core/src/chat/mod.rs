//! Chat relay, response framing and the client-side conversation model.

pub mod conversation;
pub mod frame;
pub mod relay;

pub use conversation::{Conversation, Submission};
pub use frame::{FrameDecoder, FrameError, StreamFormat};
pub use relay::{ChatRelay, RelaySettings, RelayStream};
