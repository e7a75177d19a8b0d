//! Cooperative token-bucket rate limiter, one instance per upstream (§4.C,
//! §5). A waiter sleeps for the computed refill delay and must return
//! promptly on cancellation without consuming a token.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        TokenBucket {
            capacity,
            refill_per_sec,
            state: Mutex::new(BucketState { tokens: capacity, last_refill: Instant::now() }),
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        state.last_refill = now;
    }

    /// Waits until a token is available, then consumes it. Returns `false`
    /// without consuming a token if `cancel` fires first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> bool {
        loop {
            let wait = {
                let mut state = self.state.lock().unwrap();
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return true;
                }
                let deficit = 1.0 - state.tokens;
                Duration::from_secs_f64((deficit / self.refill_per_sec).max(0.0))
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = cancel.cancelled() => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_succeeds_immediately_when_tokens_available() {
        let bucket = TokenBucket::new(5.0, 1.0);
        let cancel = CancellationToken::new();
        assert!(bucket.acquire(&cancel).await);
    }

    #[tokio::test]
    async fn test_acquire_returns_false_on_cancellation() {
        let bucket = TokenBucket::new(1.0, 0.001);
        let cancel = CancellationToken::new();
        // drain the single token first
        assert!(bucket.acquire(&cancel).await);
        cancel.cancel();
        assert!(!bucket.acquire(&cancel).await);
    }
}
