/*!
 * Shared request gate for concurrent chapter workers.
 *
 * Bounds outstanding provider requests with a semaphore sized from the active
 * provider's `concurrent_requests`, spaces request starts according to the
 * provider's requests-per-minute limit, and holds every worker back for a while
 * after any worker sees a transient failure.
 */

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use crate::app_config::TranslationConfig;

/// Pacing state shared by all workers
#[derive(Debug, Default)]
struct PacingState {
    /// Earliest start for the next request under the rate limit
    next_slot: Option<Instant>,
    /// No request may start before this instant
    paused_until: Option<Instant>,
}

/// Semaphore plus pacing state, shared behind an `Arc`
#[derive(Debug)]
pub struct RequestGate {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    min_interval: Option<Duration>,
    pacing: Mutex<PacingState>,
}

impl RequestGate {
    /// Create a gate; `requests_per_minute` of `None` or 0 disables pacing
    pub fn new(max_concurrent: usize, requests_per_minute: Option<u32>) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let min_interval = requests_per_minute
            .filter(|rpm| *rpm > 0)
            .map(|rpm| Duration::from_secs(60) / rpm);

        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            min_interval,
            pacing: Mutex::new(PacingState::default()),
        }
    }

    /// Gate for the active provider of a translation config
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(config.optimal_concurrent_requests(), config.get_rate_limit())
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn min_interval(&self) -> Option<Duration> {
        self.min_interval
    }

    /// Permits not currently held by a request
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a request slot; the request may start once this returns
    ///
    /// The permit is released when dropped. The semaphore is never closed, so
    /// `None` is not expected in practice.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok();

        let start = self.reserve_slot(Instant::now());
        if start > Instant::now() {
            tokio::time::sleep_until(start).await;
        }

        permit
    }

    /// Hold every worker back for `delay` from now
    pub fn pause_for(&self, delay: Duration) {
        let until = Instant::now() + delay;
        let mut pacing = self.pacing.lock();
        if pacing.paused_until.is_none_or(|current| current < until) {
            debug!("Request gate paused for {:?}", delay);
            pacing.paused_until = Some(until);
        }
    }

    /// Book the next start instant at or after `now`
    fn reserve_slot(&self, now: Instant) -> Instant {
        let mut pacing = self.pacing.lock();

        let mut start = now;
        if let Some(paused) = pacing.paused_until {
            start = start.max(paused);
        }
        if let Some(next) = pacing.next_slot {
            start = start.max(next);
        }
        if let Some(interval) = self.min_interval {
            pacing.next_slot = Some(start + interval);
        }

        start
    }
}
