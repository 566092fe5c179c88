use super::ledger::ContributorEntry;

const LOW_CONCENTRATION_PCT: f64 = 30.0;
const CONCENTRATION_SPAN_PCT: f64 = 40.0;

/// How activity is spread across the most active contributors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivityDistribution {
    pub top_1_percentage: f64,
    pub top_3_percentage: f64,
    pub top_5_percentage: f64,
}

/// Output of the concentration scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationAssessment {
    /// `0.0` when the top contributor does at most 30% of the work, `1.0` at 70% and above
    pub risk: f64,
    pub total_activity: u32,
    pub distribution: ActivityDistribution,

    /// Contributors sorted by total activity, most active first; ties keep first-seen order
    pub ranked: Vec<ContributorEntry>,
}

impl ConcentrationAssessment {
    #[must_use]
    pub fn top_contributor(&self) -> Option<&ContributorEntry> {
        self.ranked.first()
    }

    /// Share of the total activity attributable to one contributor.
    #[must_use]
    pub fn share_of(&self, entry: &ContributorEntry) -> f64 {
        percentage(entry.total_activity(), self.total_activity)
    }
}

/// Map the top contributor's share onto a `0.0..=1.0` risk.
#[must_use]
pub fn concentration_risk(top_percentage: f64) -> f64 {
    ((top_percentage - LOW_CONCENTRATION_PCT) / CONCENTRATION_SPAN_PCT).clamp(0.0, 1.0)
}

/// Rank contributors and measure how concentrated the activity is.
///
/// With no contributors at all the risk is maximal and the distribution is all zero.
#[must_use]
pub fn assess(mut entries: Vec<ContributorEntry>) -> ConcentrationAssessment {
    // stable, so equal totals keep first-seen order
    entries.sort_by_key(|entry| core::cmp::Reverse(entry.total_activity()));

    let total_activity: u32 = entries.iter().map(ContributorEntry::total_activity).sum();

    if entries.is_empty() {
        return ConcentrationAssessment {
            risk: 1.0,
            total_activity: 0,
            distribution: ActivityDistribution::default(),
            ranked: entries,
        };
    }

    let top_n = |n: usize| percentage(entries.iter().take(n).map(ContributorEntry::total_activity).sum(), total_activity);

    let distribution = ActivityDistribution {
        top_1_percentage: top_n(1),
        top_3_percentage: top_n(3),
        top_5_percentage: top_n(5),
    };

    ConcentrationAssessment {
        risk: concentration_risk(distribution.top_1_percentage),
        total_activity,
        distribution,
        ranked: entries,
    }
}

fn percentage(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(total) * 100.0
    }
}
