//! Service-level error kinds (§7). Mirrors `skyfusion_core::SkyError`'s
//! shape but covers the network/database concerns that are out of scope
//! for the pure core crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transient upstream failure on attempt {attempt}: {source}")]
    TransientUpstream {
        #[source]
        source: reqwest::Error,
        attempt: u32,
    },

    #[error("rate limited, retry after {retry_after:.1}s")]
    RateLimited { retry_after: f64 },

    #[error("bad upstream payload: {0}")]
    BadPayload(String),

    #[error("provider disabled")]
    ProviderDisabled,
}

impl FetchError {
    /// Per §7: `TransientUpstream` is retried with exponential backoff
    /// (factor 2) up to 3 attempts; everything else is not retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::TransientUpstream { attempt, .. } if *attempt < 3)
    }
}
