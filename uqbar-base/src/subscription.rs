use std::time::Duration;

use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use uqbar_core::{ChainClient, SubscriptionEvent};

/// How closed subscriptions are re-established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResubscribeConfig {
    /// Wait before the first retry
    pub initial_backoff_ms: u64,
    /// Upper bound of the doubling wait
    pub max_backoff_ms: u64,
    /// Consecutive failed attempts before giving up
    pub max_attempts: u32,
}

impl Default for ResubscribeConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            max_attempts: 10,
        }
    }
}

impl ResubscribeConfig {
    fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// A supervised subscription gave up
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Gave up on subscription {app}{path} after {attempts} consecutive failures")]
pub struct SubscriptionExhausted {
    /// Agent
    pub app: String,
    /// Path
    pub path: String,
    /// Consecutive failures
    pub attempts: u32,
}

/// Keep a subscription open, feeding every event to `handler`.
///
/// When the subscription errors, quits, or cannot be opened, it is
/// re-established after a backoff that doubles up to `max_backoff_ms`.
/// Receiving an event resets the backoff and the failure count. Returns once
/// `max_attempts` consecutive attempts have failed.
#[instrument(skip_all, fields(app = %app, path = %path))]
pub async fn run_supervised<C, H>(
    client: C,
    app: &str,
    path: &str,
    config: &ResubscribeConfig,
    mut handler: H,
) -> Result<(), SubscriptionExhausted>
where
    C: ChainClient,
    H: FnMut(Value) + Send,
{
    let mut failures = 0u32;
    let mut backoff = config.initial_backoff();
    loop {
        match client.subscribe(app, path).await {
            Ok(mut stream) => {
                info!("Subscribed");
                while let Some(event) = stream.next().await {
                    match event {
                        SubscriptionEvent::Event(value) => {
                            failures = 0;
                            backoff = config.initial_backoff();
                            handler(value);
                        }
                        SubscriptionEvent::Error(reason) => {
                            warn!(%reason, "Subscription errored");
                            break;
                        }
                        SubscriptionEvent::Quit => {
                            warn!("Subscription quit");
                            break;
                        }
                    }
                }
            }
            Err(err) => warn!(error = %err, "Failed to subscribe"),
        }

        failures += 1;
        if failures > config.max_attempts {
            error!(failures, "Giving up on subscription");
            return Err(SubscriptionExhausted {
                app: app.to_owned(),
                path: path.to_owned(),
                attempts: failures - 1,
            });
        }
        warn!(?backoff, failures, "Resubscribing");
        sleep(backoff).await;
        backoff = (backoff * 2).min(config.max_backoff());
    }
}
