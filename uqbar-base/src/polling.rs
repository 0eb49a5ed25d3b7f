use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::debug;

/// Fixed-interval polling, bounded by a number of attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Time between attempts
    pub interval_ms: u64,
    /// Attempts before giving up
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            max_attempts: 120,
        }
    }
}

impl PollConfig {
    /// Time between attempts
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Polling gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Condition not met after {attempts} attempts")]
pub struct PollExhausted {
    /// Attempts made
    pub attempts: u32,
}

/// Call `probe` until it yields a value, sleeping `interval` between calls.
/// The first call happens immediately.
pub async fn poll_until<T, F, Fut>(config: &PollConfig, mut probe: F) -> Result<T, PollExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=config.max_attempts {
        if let Some(value) = probe().await {
            return Ok(value);
        }
        debug!(attempt, max_attempts = config.max_attempts, "Condition not met yet");
        if attempt < config.max_attempts {
            sleep(config.interval()).await;
        }
    }
    Err(PollExhausted {
        attempts: config.max_attempts,
    })
}

#[cfg(test)]
mod test {
    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn returns_first_value() {
        let config = PollConfig {
            interval_ms: 100,
            max_attempts: 10,
        };
        let start = Instant::now();
        let mut calls = 0;
        let value = poll_until(&config, || {
            calls += 1;
            let n = calls;
            async move { (n == 3).then_some(n) }
        })
        .await
        .unwrap();
        assert_eq!(value, 3);
        assert_eq!(Instant::now() - start, Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let config = PollConfig {
            interval_ms: 50,
            max_attempts: 4,
        };
        let mut calls = 0;
        let err = poll_until(&config, || {
            calls += 1;
            async { None::<()> }
        })
        .await
        .unwrap_err();
        assert_eq!(err.attempts, 4);
        assert_eq!(calls, 4);
    }
}
