//! Bounded timeout + single retry for calls to external capabilities
//! (generation, embeddings, speech synthesis).

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Total attempts per call: the first try plus one retry.
pub const MAX_ATTEMPTS: u32 = 2;

/// Delay before the retry.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Errors from an external capability that can tell whether a retry may help.
pub trait Transient: Display {
    fn is_transient(&self) -> bool;

    /// Error reported when an attempt exceeds its time budget.
    fn timed_out(after: Duration) -> Self;
}

/// Runs `op` with a per-attempt timeout, retrying once when the failure is transient.
/// Non-transient errors are returned immediately.
pub async fn with_retry<T, E, F, Fut>(what: &str, timeout: Duration, mut op: F) -> Result<T, E>
where
    E: Transient,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        let error = match tokio::time::timeout(timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => E::timed_out(timeout),
        };

        if attempt >= MAX_ATTEMPTS || !error.is_transient() {
            return Err(error);
        }

        warn!(
            "{what} attempt {attempt} failed ({error}), retrying after {}ms...",
            RETRY_DELAY.as_millis()
        );
        tokio::time::sleep(RETRY_DELAY).await;
        attempt += 1;
    }
}
