use super::round_to;
use crate::facts::IssueRecord;

const SECONDS_PER_DAY: f64 = 86400.0;

/// Issue, pull request, and commit throughput over the look-back window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RepositoryStatistics {
    pub total_issues: u32,
    pub total_prs: u32,
    pub closed_issues: u32,
    pub closed_prs: u32,
    pub avg_issue_close_time_days: Option<f64>,
    pub avg_pr_close_time_days: Option<f64>,

    /// Approximated by the close time of every closed issue and pull request
    pub avg_response_time_days: Option<f64>,

    pub total_commits: u32,
    pub commit_frequency_per_day: f64,
}

#[derive(Debug, Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn rounded(&self) -> Option<f64> {
        (self.count > 0).then(|| round_to(self.sum / f64::from(self.count), 2))
    }
}

/// Compute statistics from window-filtered issues and the number of window commits.
#[must_use]
pub fn compute(issues: &[IssueRecord], total_commits: u32, window_days: u32) -> RepositoryStatistics {
    let mut stats = RepositoryStatistics {
        total_commits,
        commit_frequency_per_day: if window_days > 0 {
            round_to(f64::from(total_commits) / f64::from(window_days), 2)
        } else {
            0.0
        },
        ..RepositoryStatistics::default()
    };

    let mut issue_close = Mean::default();
    let mut pr_close = Mean::default();
    let mut response = Mean::default();

    for issue in issues {
        if issue.is_pull_request {
            stats.total_prs += 1;
        } else {
            stats.total_issues += 1;
        }

        if !issue.is_closed() {
            continue;
        }

        if issue.is_pull_request {
            stats.closed_prs += 1;
        } else {
            stats.closed_issues += 1;
        }

        if let Some(days) = close_time_days(issue) {
            if issue.is_pull_request {
                pr_close.add(days);
            } else {
                issue_close.add(days);
            }
            response.add(days);
        }
    }

    stats.avg_issue_close_time_days = issue_close.rounded();
    stats.avg_pr_close_time_days = pr_close.rounded();
    stats.avg_response_time_days = response.rounded();
    stats
}

#[expect(clippy::cast_precision_loss, reason = "second counts fit comfortably in f64")]
fn close_time_days(issue: &IssueRecord) -> Option<f64> {
    issue
        .closed_at
        .map(|closed_at| (closed_at - issue.created_at).num_seconds() as f64 / SECONDS_PER_DAY)
}
