//! Upstream data providers (§6): military bulk/point-radius/by-hex feeds,
//! an OpenSky-style states endpoint, and a news article feed. Each
//! provider returns `skyfusion_core::aggregator::SourceRecord`s so the
//! aggregator never sees wire shapes.

pub mod llm;
pub mod military;
pub mod news;
pub mod opensky;

use crate::errors::FetchError;

/// Retries a fetch closure per §7: up to 3 attempts, exponential backoff
/// with factor 2, only for `TransientUpstream`.
pub async fn with_retry<T, F, Fut>(mut f: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1;
    loop {
        match f(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() => {
                let backoff = std::time::Duration::from_secs_f64(0.5 * 2f64.powi(attempt as i32 - 1));
                tracing::warn!(attempt, error = %e, "transient upstream failure, retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
