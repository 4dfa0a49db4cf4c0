//! Where the relay finds the provider API key.

use secrecy::{ExposeSecret, Secret};

/// Source of the provider API key.
#[derive(Clone)]
pub enum KeySource {
    /// Read the named environment variable on every request, so a key
    /// rotated in the environment is picked up without a restart.
    Environment(String),
    /// Key handed over when the handler was constructed.
    Fixed(Secret<String>),
}

impl KeySource {
    /// Current key, or `None` when it is absent or blank.
    pub fn resolve(&self) -> Option<Secret<String>> {
        let key = match self {
            KeySource::Environment(var) => Secret::new(std::env::var(var).ok()?),
            KeySource::Fixed(key) => key.clone(),
        };

        if key.expose_secret().trim().is_empty() {
            None
        } else {
            Some(key)
        }
    }
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Environment(var) => f.debug_tuple("Environment").field(var).finish(),
            KeySource::Fixed(_) => f.write_str("Fixed([REDACTED])"),
        }
    }
}
