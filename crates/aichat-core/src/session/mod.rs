//! Client session: demo login gate, persisted profile and view guard.
//!
//! Trust is entirely client-resident. There is no server verification and
//! no expiry; anyone with write access to the session storage is "signed
//! in". This is acceptable only because the application is a demo.

pub mod gate;
pub mod profile;
pub mod storage;
pub mod view;

pub use gate::SessionGate;
pub use storage::{MemorySessionStorage, SessionStorage};
pub use view::{Navigation, View, resolve_view};
