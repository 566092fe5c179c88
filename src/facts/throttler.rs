//! Admission control for GitHub API requests.

use chrono::{DateTime, TimeDelta, Utc};
use core::time::Duration;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};
use tokio::time::Instant;

/// Longest we are willing to sit out a rate limit, whatever reset time GitHub reports
const MAX_RATE_LIMIT_WAIT_SECS: i64 = 3600;

/// A new pause must end at least this much later than the active one to replace it
const MIN_PAUSE_EXTENSION: Duration = Duration::from_secs(1);

/// Caps the number of requests in flight, and holds every new request back once GitHub
/// reports that the rate limit is exhausted.
///
/// The resume deadline only ever moves forward, so the latest reported reset wins.
#[derive(Debug)]
pub struct Throttler {
    slots: Arc<Semaphore>,
    resume_at: watch::Sender<Option<Instant>>,
}

impl Throttler {
    #[must_use]
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        let (resume_at, _) = watch::channel(None);
        Arc::new(Self {
            slots: Arc::new(Semaphore::new(max_concurrent)),
            resume_at,
        })
    }

    /// Wait for any rate-limit pause to lapse, then take a request slot.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        loop {
            if let Some(deadline) = self.paused_until() {
                tokio::time::sleep_until(deadline).await;
                continue;
            }

            let permit = Arc::clone(&self.slots)
                .acquire_owned()
                .await
                .expect("semaphore is never closed");

            // a pause may have started while we queued for the slot
            if self.paused_until().is_none() {
                return permit;
            }
        }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused_until().is_some()
    }

    /// Hold back new requests until `reset_at`, as reported by the `x-ratelimit-reset` header.
    ///
    /// Returns the time requests resume, or `None` when the reset is already past or an
    /// equal or later pause is in effect.
    pub fn pause_until_reset(&self, reset_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        let resume_at = reset_at.min(now + TimeDelta::seconds(MAX_RATE_LIMIT_WAIT_SECS));
        let wait = (resume_at - now).to_std().ok().filter(|wait| !wait.is_zero())?;

        self.pause_for(wait).then_some(resume_at)
    }

    /// Hold back new requests for `duration`. Requests already in flight keep running.
    pub fn pause_for(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        self.resume_at.send_if_modified(|current| {
            if current.is_some_and(|existing| existing + MIN_PAUSE_EXTENSION >= deadline) {
                return false;
            }
            *current = Some(deadline);
            true
        })
    }

    fn paused_until(&self) -> Option<Instant> {
        (*self.resume_at.borrow()).filter(|deadline| *deadline > Instant::now())
    }
}
