use thiserror::Error;

/// Failures talking to a catalog provider.
///
/// Every variant is an upstream-dependency failure from the caller's point of
/// view; the variants only exist so logs and tests can tell them apart.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },

    #[error("network failure talking to {provider}: {message}")]
    Network {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} responded with HTTP {status}: {message}")]
    Status {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} reported an error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned an unreadable payload: {message}")]
    Payload {
        provider: &'static str,
        message: String,
    },
}

impl CatalogError {
    pub fn provider(&self) -> &'static str {
        match self {
            CatalogError::Timeout { provider }
            | CatalogError::Network { provider, .. }
            | CatalogError::Status { provider, .. }
            | CatalogError::Provider { provider, .. }
            | CatalogError::Payload { provider, .. } => provider,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CatalogError::Timeout { .. })
    }

    pub(crate) fn from_transport(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout { provider }
        } else if err.is_decode() {
            CatalogError::Payload {
                provider,
                message: err.to_string(),
            }
        } else {
            CatalogError::Network {
                provider,
                message: err.to_string(),
            }
        }
    }
}
