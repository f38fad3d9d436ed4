//! Reconnection policy layered above the client.
//!
//! The client's state machine never reconnects on its own; recovery from a
//! disconnect is an explicit `connect()`. This module automates that call for
//! callers that opt in, driving it entirely through the client's public event
//! surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::bus::HandlerId;
use crate::client::StreamClient;
use crate::events::EventCategory;

/// Backoff configuration for reconnection attempts.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the retry delay.
    pub max_delay: Duration,
    /// Multiplier applied per consecutive retry.
    pub backoff_multiplier: f64,
    /// Maximum consecutive retries before giving up (`None` = unlimited).
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            max_attempts: None,
        }
    }
}

impl ReconnectConfig {
    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .powi(attempt.saturating_sub(1) as i32);
        let millis = (self.initial_delay.as_millis() as f64 * factor) as u64;
        Duration::from_millis(millis).min(self.max_delay)
    }

    /// Whether retry number `attempt` (1-based) is still allowed.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt <= max,
            None => true,
        }
    }
}

/// Opt-in reconnection driver for a [`StreamClient`].
///
/// Watches the client's `disconnect` events and re-invokes `connect()` after
/// an exponential-backoff delay; a `connect` event resets the attempt
/// counter. Dropping the policy without calling [`Self::stop`] leaves it
/// running for the life of the client.
pub struct ReconnectPolicy {
    client: Arc<StreamClient>,
    connect_id: HandlerId,
    disconnect_id: HandlerId,
    stopped: Arc<AtomicBool>,
    driver: tokio::task::JoinHandle<()>,
}

impl ReconnectPolicy {
    /// Attach a reconnection policy to `client`.
    #[must_use]
    pub fn attach(client: &Arc<StreamClient>, config: ReconnectConfig) -> Self {
        let attempts = Arc::new(AtomicU32::new(0));
        let stopped = Arc::new(AtomicBool::new(false));
        let (drop_tx, mut drop_rx) = mpsc::unbounded_channel::<()>();

        let connect_id = {
            let attempts = Arc::clone(&attempts);
            client.on(EventCategory::Connect, move |_| {
                attempts.store(0, Ordering::SeqCst);
                Ok(())
            })
        };
        let disconnect_id = client.on(EventCategory::Disconnect, move |_| {
            let _ = drop_tx.send(());
            Ok(())
        });

        let driver = {
            let client = Arc::clone(client);
            let stopped = Arc::clone(&stopped);
            tokio::spawn(async move {
                while let Some(()) = drop_rx.recv().await {
                    if stopped.load(Ordering::SeqCst) {
                        break;
                    }
                    let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if !config.should_retry(attempt) {
                        warn!(attempt, "giving up on reconnection");
                        break;
                    }
                    let delay = config.delay_for_attempt(attempt);
                    info!(attempt, ?delay, "scheduling reconnect");
                    sleep(delay).await;
                    if stopped.load(Ordering::SeqCst) {
                        break;
                    }
                    client.connect();
                }
            })
        };

        Self {
            client: Arc::clone(client),
            connect_id,
            disconnect_id,
            stopped,
            driver,
        }
    }

    /// Detach the policy and cancel any pending retry.
    pub fn stop(self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.client.off(EventCategory::Connect, self.connect_id);
        self.client.off(EventCategory::Disconnect, self.disconnect_id);
        self.driver.abort();
    }
}
