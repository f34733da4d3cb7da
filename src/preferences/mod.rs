pub mod models;
mod preference_store;
mod sqlite_discovery_store;

pub use models::{
    DiscoveryUser, PreferenceSignal, PreferenceSource, PreferenceStatus, UpsertOutcome,
    ONBOARDING_THRESHOLD,
};
pub use preference_store::{FullDiscoveryStore, PreferenceStore, UserStore};
pub use sqlite_discovery_store::SqliteDiscoveryStore;
