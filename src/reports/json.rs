use crate::Result;
use crate::analysis::{AnalysisOutcome, ContributorEntry, RiskFactors, RiskLevel, RiskReport, SentimentSummary};
use core::fmt::Write;
use serde_json::{Map, Value, json};

/// Write the batch envelope: a risk-level summary followed by one entry per repository.
pub fn generate<W: Write>(reports: &[RiskReport], writer: &mut W) -> Result<()> {
    let count = |level: RiskLevel| reports.iter().filter(|r| r.risk_level == level).count();

    let output = json!({
        "summary": {
            "total_repositories": reports.len(),
            "high_risk_count": count(RiskLevel::High),
            "medium_risk_count": count(RiskLevel::Medium),
            "low_risk_count": count(RiskLevel::Low),
        },
        "analyses": reports.iter().map(report_to_json).collect::<Vec<_>>(),
    });

    write!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

fn report_to_json(report: &RiskReport) -> Value {
    let key_risk_factors = match &report.outcome {
        AnalysisOutcome::Complete(factors) => factors_to_json(factors),
        AnalysisOutcome::Failed { error } => json!({ "error": error }),
        AnalysisOutcome::TimedOut { after } => json!({ "error": format!("analysis timed out after {}s", after.as_secs()) }),
    };

    json!({
        "repository": report.repository,
        "overall_risk_score": report.overall_risk_score,
        "risk_level": report.risk_level.to_string(),
        "key_risk_factors": key_risk_factors,
        "recommendations": report.recommendations,
        "analysis_date": report.analysis_date.to_rfc3339(),
    })
}

#[expect(unused_results, reason = "Map::insert never replaces here")]
fn factors_to_json(factors: &RiskFactors) -> Value {
    let concentration = &factors.concentration;
    let distribution = &concentration.distribution;
    let statistics = &factors.statistics;
    let repository = &factors.repository;

    let mut obj = Map::new();
    obj.insert("contributor_concentration_risk".to_string(), json!(concentration.risk));
    obj.insert("total_active_contributors".to_string(), json!(factors.total_active_contributors()));
    obj.insert("recent_commits_analyzed".to_string(), json!(factors.recent_commits_analyzed));
    obj.insert("recent_issues_analyzed".to_string(), json!(factors.recent_issues_analyzed));
    obj.insert("total_activity_events".to_string(), json!(concentration.total_activity));
    obj.insert("bots_filtered".to_string(), json!(factors.bots_filtered));

    obj.insert(
        "repository".to_string(),
        json!({
            "full_name": repository.full_name,
            "description": repository.description,
            "stars": repository.stars,
            "forks": repository.forks,
            "open_issues": repository.open_issues,
        }),
    );

    obj.insert(
        "repository_statistics".to_string(),
        json!({
            "total_issues": statistics.total_issues,
            "total_prs": statistics.total_prs,
            "closed_issues": statistics.closed_issues,
            "closed_prs": statistics.closed_prs,
            "avg_issue_close_time_days": statistics.avg_issue_close_time_days,
            "avg_pr_close_time_days": statistics.avg_pr_close_time_days,
            "avg_response_time_days": statistics.avg_response_time_days,
            "total_commits": statistics.total_commits,
            "commit_frequency_per_day": statistics.commit_frequency_per_day,
        }),
    );

    if let Some(top) = concentration.top_contributor() {
        obj.insert(
            "top_contributor".to_string(),
            json!({
                "login": top.login,
                "name": top.name,
                "total_activity": top.total_activity(),
                "percentage": distribution.top_1_percentage,
            }),
        );
    }

    obj.insert(
        "active_contributors".to_string(),
        json!(
            concentration
                .ranked
                .iter()
                .map(|entry| contributor_to_json(entry, concentration.share_of(entry)))
                .collect::<Vec<_>>()
        ),
    );

    obj.insert(
        "activity_distribution".to_string(),
        json!({
            "top_1_contributor_percentage": distribution.top_1_percentage,
            "top_3_contributors_percentage": distribution.top_3_percentage,
            "top_5_contributors_percentage": distribution.top_5_percentage,
        }),
    );

    Value::Object(obj)
}

#[expect(unused_results, reason = "Map::insert never replaces here")]
fn contributor_to_json(entry: &ContributorEntry, activity_percentage: f64) -> Value {
    let mut obj = Map::new();
    obj.insert("login".to_string(), json!(entry.login));
    obj.insert("name".to_string(), json!(entry.name));
    obj.insert("email".to_string(), json!(entry.email));
    obj.insert("email_type".to_string(), json!(entry.email_category.to_string()));
    obj.insert(
        "activity_breakdown".to_string(),
        json!({
            "commits": entry.commits,
            "issues_created": entry.issues_created,
            "prs_created": entry.prs_created,
            "reviews_given": entry.reviews_given,
            "comments_made": entry.comments_made,
        }),
    );
    obj.insert("total_activity".to_string(), json!(entry.total_activity()));
    obj.insert("activity_percentage".to_string(), json!(activity_percentage));
    obj.insert("quarterly_activity".to_string(), json!(entry.quarterly_activity));
    obj.insert("activity_trend".to_string(), json!(entry.trend.to_string()));

    if let Some(sentiment) = &entry.sentiment {
        obj.insert("sentiment_analysis".to_string(), sentiment_to_json(sentiment));
    }

    Value::Object(obj)
}

fn sentiment_to_json(sentiment: &SentimentSummary) -> Value {
    json!({
        "average_polarity": sentiment.average_polarity,
        "average_subjectivity": sentiment.average_subjectivity,
        "comments_analyzed": sentiment.messages_analyzed,
        "sentiment_label": sentiment.label.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::concentration::assess;
    use crate::analysis::ledger::ActivityKind;
    use crate::analysis::{EmailCategory, RepositoryStatistics};
    use crate::facts::RepositoryInfo;
    use chrono::{DateTime, Utc};
    use core::time::Duration;
    use ohno::app_err;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-15T10:30:00Z").unwrap().to_utc()
    }

    fn complete_report() -> RiskReport {
        let mut alice = ContributorEntry::from_commit("alice", "Alice", "alice@gmail.com", EmailCategory::Personal);
        alice.record(ActivityKind::Commit, 5, Some(3));
        let mut bob = ContributorEntry::from_login("bob");
        bob.record(ActivityKind::Review, 3, Some(2));
        bob.sentiment = Some(SentimentSummary::insufficient_activity());
        let mut carol = ContributorEntry::from_login("carol");
        carol.record(ActivityKind::Comment, 2, None);

        let factors = RiskFactors {
            concentration: assess(vec![carol, bob, alice]),
            statistics: RepositoryStatistics::default(),
            repository: RepositoryInfo {
                full_name: "owner/repo".to_string(),
                stars: Some(10),
                ..RepositoryInfo::default()
            },
            recent_commits_analyzed: 8,
            recent_issues_analyzed: 1,
            bots_filtered: 3,
        };

        RiskReport::complete("owner/repo", factors, now())
    }

    fn parse(reports: &[RiskReport]) -> Value {
        let mut output = String::new();
        generate(reports, &mut output).unwrap();
        serde_json::from_str(&output).unwrap()
    }

    #[test]
    fn test_envelope_summary_counts() {
        let failed = RiskReport::failed("owner/broken", &app_err!("boom"), now());
        let value = parse(&[complete_report(), failed]);

        assert_eq!(value["summary"]["total_repositories"], json!(2));
        assert_eq!(value["summary"]["high_risk_count"], json!(1));
        assert_eq!(value["summary"]["medium_risk_count"], json!(1));
        assert_eq!(value["summary"]["low_risk_count"], json!(0));
    }

    #[test]
    fn test_complete_analysis_fields() {
        let value = parse(&[complete_report()]);
        let analysis = &value["analyses"][0];

        assert_eq!(analysis["repository"], json!("owner/repo"));
        assert_eq!(analysis["overall_risk_score"], json!(0.5));
        assert_eq!(analysis["risk_level"], json!("Medium"));
        assert_eq!(analysis["analysis_date"], json!("2025-01-15T10:30:00+00:00"));

        let factors = &analysis["key_risk_factors"];
        assert_eq!(factors["total_active_contributors"], json!(3));
        assert_eq!(factors["total_activity_events"], json!(10));
        assert_eq!(factors["bots_filtered"], json!(3));
        assert_eq!(factors["top_contributor"]["login"], json!("alice"));
        assert_eq!(factors["repository"]["stars"], json!(10));
        assert_eq!(factors["repository_statistics"]["avg_pr_close_time_days"], Value::Null);

        let contributors = factors["active_contributors"].as_array().unwrap();
        assert_eq!(contributors[0]["email_type"], json!("personal"));
        assert_eq!(contributors[0]["quarterly_activity"], json!([0, 0, 0, 5]));
        assert_eq!(contributors[0]["activity_percentage"], json!(50.0));
        assert!(contributors[0].get("sentiment_analysis").is_none());
        assert_eq!(contributors[1]["sentiment_analysis"]["sentiment_label"], json!("insufficient_activity"));
    }

    #[test]
    fn test_failed_and_timed_out_factors() {
        let failed = RiskReport::failed("owner/broken", &app_err!("repository 'owner/broken' not found"), now());
        let timed_out = RiskReport::timed_out("owner/slow", Duration::from_secs(45), now());
        let value = parse(&[failed, timed_out]);

        let failed = &value["analyses"][0];
        assert_eq!(failed["overall_risk_score"], json!(1.0));
        assert_eq!(failed["risk_level"], json!("High"));
        assert!(failed["key_risk_factors"]["error"].as_str().unwrap().contains("not found"));
        assert_eq!(failed["recommendations"], json!(["Unable to analyze repository"]));

        assert_eq!(value["analyses"][1]["key_risk_factors"]["error"], json!("analysis timed out after 45s"));
    }

    #[test]
    fn test_empty_batch() {
        let value = parse(&[]);
        assert_eq!(value["summary"]["total_repositories"], json!(0));
        assert_eq!(value["analyses"], json!([]));
    }
}
