//! Prompt relay: forwards a user prompt to a generative-text provider and
//! relays the generated text back as JSON.

pub mod config;
pub mod handlers;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application};
