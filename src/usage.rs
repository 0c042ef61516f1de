//! LLM usage statistics
//!
//! [`UsageMonitor`] is the on-demand view (load, reset). [`UsagePoller`]
//! refreshes the statistics on a fixed interval while a generation runs and
//! publishes each snapshot on a watch channel.

use crate::api::{CurriculumApi, UsageStats};
use crate::cancel::{ensure_active, guarded};
use crate::error::{is_cancelled, Result};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Usage statistics and when they were fetched
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSnapshot {
    /// Statistics as returned by the backend
    pub stats: UsageStats,
    /// Fetch time
    pub fetched_at: DateTime<Utc>,
}

impl UsageSnapshot {
    fn now(stats: UsageStats) -> Self {
        Self {
            stats,
            fetched_at: Utc::now(),
        }
    }
}

/// On-demand usage view
pub struct UsageMonitor {
    api: Arc<dyn CurriculumApi>,
    cancellation: CancellationToken,
    latest: Option<UsageSnapshot>,
    error: Option<String>,
}

impl UsageMonitor {
    /// Create an empty monitor
    pub fn new(api: Arc<dyn CurriculumApi>) -> Self {
        Self {
            api,
            cancellation: CancellationToken::new(),
            latest: None,
            error: None,
        }
    }

    /// Tie the monitor's lifetime to `token`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Last fetched snapshot
    pub fn latest(&self) -> Option<&UsageSnapshot> {
        self.latest.as_ref()
    }

    /// Last recorded error message
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch current statistics
    ///
    /// # Errors
    ///
    /// Returns the request error after recording it
    pub async fn load(&mut self) -> Result<&UsageSnapshot> {
        ensure_active(&self.cancellation)?;
        match guarded(&self.cancellation, self.api.get_usage()).await {
            Ok(stats) => {
                self.error = None;
                Ok(&*self.latest.insert(UsageSnapshot::now(stats)))
            }
            Err(e) => {
                if !is_cancelled(&e) {
                    self.error = Some(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Reset the backend counters, then reload them
    ///
    /// # Errors
    ///
    /// Returns error if either the reset or the reload fails
    pub async fn reset(&mut self) -> Result<&UsageSnapshot> {
        ensure_active(&self.cancellation)?;
        if let Err(e) = guarded(&self.cancellation, self.api.reset_usage()).await {
            if !is_cancelled(&e) {
                self.error = Some(e.to_string());
            }
            return Err(e);
        }
        tracing::info!("Usage statistics reset");
        self.load().await
    }
}

/// Background usage refresh
///
/// Polls once immediately, then every `interval`. A failed poll is logged
/// and the previous snapshot stays published. Dropping the poller stops it.
pub struct UsagePoller {
    receiver: watch::Receiver<Option<UsageSnapshot>>,
    cancellation: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl UsagePoller {
    /// Start polling
    ///
    /// The poller stops when `parent` is cancelled or [`UsagePoller::stop`]
    /// is called.
    pub fn spawn(
        api: Arc<dyn CurriculumApi>,
        interval: Duration,
        parent: &CancellationToken,
    ) -> Self {
        let cancellation = parent.child_token();
        let (tx, receiver) = watch::channel(None);
        let interval = interval.max(Duration::from_millis(1));
        let token = cancellation.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                match guarded(&token, api.get_usage()).await {
                    Ok(stats) => {
                        if token.is_cancelled() {
                            break;
                        }
                        tracing::debug!(
                            "Usage: {} requests, {} tokens",
                            stats.total_requests,
                            stats.total_tokens
                        );
                        if tx.send(Some(UsageSnapshot::now(stats))).is_err() {
                            break;
                        }
                    }
                    Err(e) if is_cancelled(&e) => break,
                    Err(e) => tracing::warn!("Usage poll failed: {}", e),
                }
            }
            tracing::debug!("Usage poller stopped");
        });

        Self {
            receiver,
            cancellation,
            handle: Some(handle),
        }
    }

    /// Most recent snapshot, if any poll has succeeded
    pub fn latest(&self) -> Option<UsageSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Receiver notified on every successful poll
    pub fn subscribe(&self) -> watch::Receiver<Option<UsageSnapshot>> {
        self.receiver.clone()
    }

    /// Stop polling and wait for the task to exit
    pub async fn stop(mut self) {
        self.cancellation.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for UsagePoller {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
