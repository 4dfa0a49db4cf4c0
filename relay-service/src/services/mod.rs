pub mod credentials;
pub mod providers;

pub use credentials::KeySource;
pub use providers::{GenerationParams, ProviderError, TextProvider};
