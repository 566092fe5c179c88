use chrono::{DateTime, Duration, Utc};

/// Number of quarterly buckets the look-back window is split into.
pub const QUARTERS: usize = 4;

/// Longest look-back window accepted, in days.
pub const MAX_WINDOW_DAYS: u32 = 365;

/// The fixed look-back period of a single analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    now: DateTime<Utc>,
    days: u32,
}

impl AnalysisWindow {
    /// Create a window ending at `now` and reaching back `days` days.
    #[must_use]
    pub const fn new(now: DateTime<Utc>, days: u32) -> Self {
        Self { now, days }
    }

    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    #[must_use]
    pub const fn days(&self) -> u32 {
        self.days
    }

    /// Earliest instant that still counts as recent.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.now - Duration::days(i64::from(self.days))
    }

    /// Whether a record with this timestamp belongs to the analysis.
    ///
    /// Timestamps in the future are kept; they simply never land in a quarterly bucket.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start()
    }

    /// Quarterly bucket for a timestamp, `3` being the most recent quarter.
    #[must_use]
    pub fn quarter_of(&self, ts: DateTime<Utc>) -> Option<usize> {
        quarter_index((self.now - ts).num_days(), self.days)
    }
}

/// Map an age in whole days onto one of the four quarters of a window.
///
/// Returns `None` when the age is negative or beyond the window.
#[must_use]
pub fn quarter_index(days_ago: i64, window_days: u32) -> Option<usize> {
    if days_ago < 0 || days_ago > i64::from(window_days) {
        return None;
    }

    let quarter_len = i64::from((window_days / 4).max(1));
    let from_newest = (days_ago / quarter_len).min(3);

    // `from_newest` is within 0..=3 at this point
    usize::try_from(3 - from_newest).ok()
}
