use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors surfaced by the onboarding and recommendation operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("upstream catalog failure: {0}")]
    Upstream(#[from] CatalogError),

    #[error("user {0} not found")]
    UserNotFound(usize),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl DiscoveryError {
    pub fn is_upstream(&self) -> bool {
        matches!(self, DiscoveryError::Upstream(_))
    }
}
