//! Error taxonomy for upstream provider calls.
//!
//! Provider failures are never propagated to API callers as hard errors; the
//! aggregator folds them into its `errors` string list.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Configuration short-circuit: the lookup cannot run without a key.
    #[error("{provider} API key is not configured")]
    MissingKey { provider: &'static str },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Provider answered with a non-success HTTP status.
    #[error("{provider} returned HTTP {status}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
    },

    /// Response arrived but did not have the expected shape.
    #[error("{provider} returned an unexpected payload: {detail}")]
    Payload {
        provider: &'static str,
        detail: String,
    },

    /// Provider answered cleanly but holds no data for the query.
    #[error("{provider} has no records for {query}")]
    NotFound {
        provider: &'static str,
        query: String,
    },
}

impl ProviderError {
    /// True for a 502 from the provider, which signals upstream bot-blocking
    /// and triggers the alternate-endpoint step of the resolution chain.
    pub fn is_gateway_error(&self) -> bool {
        matches!(
            self,
            ProviderError::Status { status, .. } if status.as_u16() == 502
        )
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
