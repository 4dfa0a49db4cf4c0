//! In-process store for glucose, heart-rate variability, sleep, food,
//! supplement and energy records.
//!
//! The store is an explicit value owned by its caller; share it across tasks
//! with [`SharedBioDataStore`].

pub mod error;
pub mod models;
pub mod recommendations;
pub mod refresh;
pub mod store;

pub use error::StoreError;
pub use models::*;
pub use refresh::{shared, spawn_initial_fetch, RefreshHandle, SharedBioDataStore, INITIAL_FETCH_DELAY};
pub use store::{BioDataStore, NO_SLEEP_DURATION};
