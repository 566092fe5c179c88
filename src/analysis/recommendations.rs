use super::risk::RiskFactors;
use super::trend::ActivityTrend;

pub const ABANDONMENT_RISK: &str =
    "ABANDONMENT RISK: Primary contributor (non-company email) shows declining activity - high risk of project abandonment";
pub const CAPACITY_RISK: &str = "CAPACITY RISK: Project heavily dependent on single non-company contributor - risk of burnout or 'Nebraska problem' (single point of failure)";
pub const RECRUIT_MAINTAINERS: &str = "Consider actively recruiting additional maintainers to reduce dependency on single contributor";
pub const MONITOR_DIVERSITY: &str = "Monitor contributor diversity - one person is doing a significant portion of the work";
pub const VERY_FEW_CONTRIBUTORS: &str =
    "Critical: Very few active contributors - prioritize community building and contributor recruitment";
pub const LOW_CONTRIBUTOR_COUNT: &str = "Low contributor count - consider ways to encourage more community participation";
pub const KNOWLEDGE_SHARING: &str = "Top 3 contributors handle most activity - implement knowledge sharing and mentoring programs";
pub const HEALTHY_DISTRIBUTION: &str = "Project shows good contributor diversity and activity distribution";
pub const UNABLE_TO_ANALYZE: &str = "Unable to analyze repository";

const SLOW_PR_CLOSE_DAYS: f64 = 5.0;

/// Turn a risk-factor bundle into an ordered list of recommendations.
///
/// Never empty: when no rule fires the healthy-distribution message is returned.
#[must_use]
pub fn synthesize(factors: &RiskFactors) -> Vec<String> {
    let mut recommendations = Vec::new();
    let risk = factors.concentration.risk;
    let contributors = factors.total_active_contributors();

    if risk > 0.5
        && contributors <= 3
        && let Some(top) = factors.concentration.top_contributor()
        && !top.email_category.is_company()
    {
        match top.trend {
            ActivityTrend::Decreasing => recommendations.push(ABANDONMENT_RISK.to_string()),
            ActivityTrend::Stable | ActivityTrend::Increasing => recommendations.push(CAPACITY_RISK.to_string()),
            ActivityTrend::InsufficientData => {}
        }
    }

    if let Some(days) = factors.statistics.avg_pr_close_time_days
        && days > SLOW_PR_CLOSE_DAYS
    {
        recommendations.push(format!(
            "SECURITY RISK: Average PR close time ({days:.1} days) exceeds 5 days - security patches may not be applied quickly enough"
        ));
    }

    if risk > 0.7 {
        recommendations.push(RECRUIT_MAINTAINERS.to_string());
    } else if risk > 0.4 {
        recommendations.push(MONITOR_DIVERSITY.to_string());
    }

    if contributors < 3 {
        recommendations.push(VERY_FEW_CONTRIBUTORS.to_string());
    } else if contributors < 5 {
        recommendations.push(LOW_CONTRIBUTOR_COUNT.to_string());
    }

    if factors.concentration.distribution.top_3_percentage > 80.0 {
        recommendations.push(KNOWLEDGE_SHARING.to_string());
    }

    if recommendations.is_empty() {
        recommendations.push(HEALTHY_DISTRIBUTION.to_string());
    }

    recommendations
}
