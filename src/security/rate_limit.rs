//! Sliding-window rate limiting keyed by client identity.
//!
//! Each identity owns a queue of request instants inside the trailing
//! window. Pruning happens lazily on access; identities that have gone
//! quiet are dropped by [`RateLimiter::sweep`], which a background task runs
//! periodically. The number of tracked identities is capped so that a flood
//! of distinct addresses cannot grow the store without bound.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests recorded in the current window, including this one if allowed.
    pub count: u32,
    pub limit: u32,
}

impl RateDecision {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }
}

/// Per-identity sliding-window limiter.
pub struct RateLimiter {
    windows: DashMap<String, VecDeque<Instant>>,
    window: Duration,
    max_requests: u32,
    max_identities: usize,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            window: Duration::from_secs(config.window_secs),
            max_requests: config.max_requests,
            max_identities: config.max_tracked_identities.max(1),
        }
    }

    /// Window length, also used as the retry-after hint.
    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    /// Record a request for `identity` if it is under the limit.
    pub fn check(&self, identity: &str) -> RateDecision {
        self.check_at(identity, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, identity: &str, now: Instant) -> RateDecision {
        if !self.windows.contains_key(identity) && self.windows.len() >= self.max_identities {
            self.make_room(now);
        }

        let mut entry = self.windows.entry(identity.to_string()).or_default();
        let timestamps = entry.value_mut();
        prune(timestamps, now, self.window);

        let current = timestamps.len() as u32;
        if current >= self.max_requests {
            return RateDecision {
                allowed: false,
                count: current,
                limit: self.max_requests,
            };
        }

        timestamps.push_back(now);
        RateDecision {
            allowed: true,
            count: current + 1,
            limit: self.max_requests,
        }
    }

    /// Drop identities with no requests left inside the window.
    ///
    /// Returns the number of identities removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        let window = self.window;
        self.windows.retain(|_, timestamps| {
            prune(timestamps, now, window);
            !timestamps.is_empty()
        });
        let removed = before.saturating_sub(self.windows.len());
        metrics::record_tracked_identities(self.windows.len());
        removed
    }

    /// Number of identities currently held in memory.
    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }

    fn make_room(&self, now: Instant) {
        if self.sweep_at(now) > 0 && self.windows.len() < self.max_identities {
            return;
        }

        // Still full of live identities: evict the one whose latest request is oldest.
        let stalest = self
            .windows
            .iter()
            .min_by_key(|entry| entry.value().back().copied())
            .map(|entry| entry.key().clone());

        if let Some(key) = stalest {
            self.windows.remove(&key);
            tracing::debug!(identity = %key, "Evicted rate-limit window at capacity");
        }
    }
}

fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = timestamps.front() {
        if now.saturating_duration_since(oldest) >= window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

/// Run [`RateLimiter::sweep`] every `interval` until shutdown is signalled.
pub fn spawn_sweeper(
    limiter: Arc<RateLimiter>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep();
                    if removed > 0 {
                        tracing::debug!(
                            removed,
                            tracked = limiter.tracked_identities(),
                            "Swept idle rate-limit windows"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate-limit sweeper stopping");
                    break;
                }
            }
        }
    })
}
