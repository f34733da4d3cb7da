//! Music discovery library
//!
//! Catalog provider clients, preference signals, onboarding, recommendations and
//! the owned-track listing, exposed for the CLI and for testing.

pub mod catalog;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod playlist;
pub mod preferences;
pub mod recommendation;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use catalog::{build_provider, CatalogError, CatalogProvider, ProviderKind, Track};
pub use error::DiscoveryError;
pub use onboarding::OnboardingOrchestrator;
pub use preferences::{FullDiscoveryStore, PreferenceStore, SqliteDiscoveryStore, UserStore};
pub use recommendation::{RecommendationGenerator, RecommendationSettings};
