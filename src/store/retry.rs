use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Linear backoff: `attempt * step`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub retries: usize,
    pub step: Duration,
    pub max_delay: Duration,
}

impl Backoff {
    pub fn delay(&self, attempt: usize) -> Duration {
        self.step
            .saturating_mul(attempt as u32)
            .min(self.max_delay)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            retries: 3,
            step: Duration::from_millis(50),
            max_delay: Duration::from_millis(2000),
        }
    }
}

/// Retries an async operation while `is_transient` holds for its error
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `backoff`: Retry count (total runs = 1 initial + retries) and delays
/// - `is_transient`: Errors for which another attempt is worthwhile
///
/// # Returns
/// Either the successful result or the last error
pub async fn with_retry<F, Fut, T, E>(
    mut operation: F,
    backoff: Backoff,
    is_transient: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > backoff.retries || !is_transient(&err) {
                    return Err(err);
                }
                let delay = backoff.delay(attempt);
                warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}...",
                    attempt, backoff.retries, err, delay
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}
