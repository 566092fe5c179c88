use super::ledger::ContributorLedger;
use super::window::QUARTERS;
use serde::Serialize;
use strum::Display;

/// Contributors below this total activity get no trend.
pub const MIN_ACTIVITY_FOR_TREND: u32 = 10;

const INCREASING_RATIO: f64 = 1.5;
const DECREASING_RATIO: f64 = 0.67;

/// Direction of a contributor's activity across the look-back window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityTrend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

/// Compare the two recent quarters against the two older ones.
#[must_use]
pub fn detect_trend(total_activity: u32, quarters: &[u32; QUARTERS]) -> ActivityTrend {
    if total_activity < MIN_ACTIVITY_FOR_TREND {
        return ActivityTrend::InsufficientData;
    }

    let [q0, q1, q2, q3] = *quarters;
    let older = q0 + q1;
    let recent = q2 + q3;

    match (older, recent) {
        (0, 0) => ActivityTrend::Stable,
        (0, _) => ActivityTrend::Increasing,
        (_, 0) => ActivityTrend::Decreasing,
        _ => {
            let ratio = f64::from(recent) / f64::from(older);
            if ratio > INCREASING_RATIO {
                ActivityTrend::Increasing
            } else if ratio < DECREASING_RATIO {
                ActivityTrend::Decreasing
            } else {
                ActivityTrend::Stable
            }
        }
    }
}

/// Label every entry's trend from its current counters.
pub fn apply_trends(ledger: &mut ContributorLedger) {
    for entry in ledger.iter_mut() {
        entry.trend = detect_trend(entry.total_activity(), &entry.quarterly_activity);
    }
}
