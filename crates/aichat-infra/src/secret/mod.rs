//! Credential sources backed by the process environment.

pub mod env;

pub use env::EnvCredentialSource;
