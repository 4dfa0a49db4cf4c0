//! HTTP handlers for the relay service.

pub mod relay;

pub use relay::{relay_prompt, RelayError};
