//! End-to-end analysis runs over an in-memory activity source.

use camino::Utf8PathBuf;
use chrono::{DateTime, Duration, Utc};
use maintainer_risk::Result;
use maintainer_risk::analysis::recommendations::{
    ABANDONMENT_RISK, CAPACITY_RISK, HEALTHY_DISTRIBUTION, UNABLE_TO_ANALYZE, VERY_FEW_CONTRIBUTORS,
};
use maintainer_risk::analysis::{
    AnalysisOutcome, AnalysisRequest, AnalysisWindow, Analyzer, AnalyzerSettings, EmailCategory, IdentityClassifier, LexiconScorer,
    RiskLevel,
};
use maintainer_risk::commands::{CONFIG_FILE_NAME, Config};
use maintainer_risk::facts::{
    ActivitySource, CommitRecord, ContributorMessage, IssueRecord, RepoSpec, RepositoryInfo, ReviewRecord,
};
use maintainer_risk::reports::generate_json;
use ohno::bail;
use std::collections::HashMap;

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z").unwrap().to_utc()
}

#[derive(Debug, Default, Clone)]
struct Activity {
    commits: Vec<CommitRecord>,
    issues: Vec<IssueRecord>,
}

/// Serves canned activity per repository; unknown repositories are not found.
#[derive(Debug, Default)]
struct InMemorySource {
    repositories: HashMap<String, Activity>,
}

impl InMemorySource {
    fn with(mut self, repo: &str, activity: Activity) -> Self {
        let _ = self.repositories.insert(repo.to_string(), activity);
        self
    }

    fn activity(&self, repo: &RepoSpec) -> Result<&Activity> {
        match self.repositories.get(&repo.to_string()) {
            Some(activity) => Ok(activity),
            None => bail!("repository '{repo}' not found"),
        }
    }
}

impl ActivitySource for InMemorySource {
    async fn repository_info(&self, repo: &RepoSpec) -> Result<RepositoryInfo> {
        let _ = self.activity(repo)?;
        Ok(RepositoryInfo {
            full_name: repo.to_string(),
            stars: Some(42),
            ..RepositoryInfo::default()
        })
    }

    async fn commits(&self, repo: &RepoSpec, _window: AnalysisWindow) -> Result<Vec<CommitRecord>> {
        Ok(self.activity(repo)?.commits.clone())
    }

    async fn issues(&self, repo: &RepoSpec, _window: AnalysisWindow) -> Result<Vec<IssueRecord>> {
        Ok(self.activity(repo)?.issues.clone())
    }

    async fn contributor_messages(
        &self,
        _repo: &RepoSpec,
        _login: &str,
        _window: AnalysisWindow,
        _limit: usize,
    ) -> Result<Vec<ContributorMessage>> {
        Ok(Vec::new())
    }
}

fn commit(login: &str, email: &str, days_ago: i64) -> CommitRecord {
    CommitRecord {
        sha: format!("{login}-{days_ago}"),
        author_login: Some(login.to_string()),
        author_name: Some(login.to_string()),
        author_email: Some(email.to_string()),
        authored_at: now() - Duration::days(days_ago),
    }
}

/// `count` commits spread evenly over the last year.
fn commits_over_year(login: &str, email: &str, count: i64) -> Vec<CommitRecord> {
    (0..count).map(|i| commit(login, email, i * 360 / count)).collect()
}

fn analyzer(source: InMemorySource) -> Analyzer<InMemorySource, LexiconScorer> {
    analyzer_with_config(source, &Config::default())
}

fn analyzer_with_config(source: InMemorySource, config: &Config) -> Analyzer<InMemorySource, LexiconScorer> {
    let classifier = IdentityClassifier::new(&config.identity, Vec::<String>::new());
    Analyzer::new(source, LexiconScorer::new(), classifier, AnalyzerSettings::default())
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
async fn single_personal_maintainer_is_high_risk() {
    let source = InMemorySource::default().with(
        "acme/solo",
        Activity {
            commits: commits_over_year("maya", "maya@gmail.com", 50),
            ..Activity::default()
        },
    );

    let factors = analyzer(source)
        .analyze("acme/solo", AnalysisWindow::new(now(), 365), false)
        .await
        .unwrap();

    assert!((factors.concentration.risk - 1.0).abs() < f64::EPSILON);
    assert_eq!(factors.total_active_contributors(), 1);

    let top = factors.concentration.top_contributor().unwrap();
    assert_eq!(top.login, "maya");
    assert_eq!(top.email_category, EmailCategory::Personal);
    assert_eq!(top.commits, 50);

    let reports = analyzer(InMemorySource::default().with(
        "acme/solo",
        Activity {
            commits: commits_over_year("maya", "maya@gmail.com", 50),
            ..Activity::default()
        },
    ))
    .analyze_batch(&AnalysisRequest::new(vec!["acme/solo".to_string()], 365), now())
    .await
    .unwrap();

    let report = &reports[0];
    assert_eq!(report.risk_level, RiskLevel::High);
    assert!(
        report
            .recommendations
            .iter()
            .any(|r| r == CAPACITY_RISK || r == ABANDONMENT_RISK)
    );
    assert!(report.recommendations.iter().any(|r| r == VERY_FEW_CONTRIBUTORS));
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
async fn evenly_shared_work_is_low_risk() {
    let commits = ["maya", "lena", "omar", "priya", "jonas"]
        .into_iter()
        .flat_map(|login| commits_over_year(login, &format!("{login}@gmail.com"), 20))
        .collect();

    let source = InMemorySource::default().with(
        "acme/shared",
        Activity {
            commits,
            ..Activity::default()
        },
    );

    let reports = analyzer(source)
        .analyze_batch(&AnalysisRequest::new(vec!["acme/shared".to_string()], 365), now())
        .await
        .unwrap();

    let report = &reports[0];
    assert!(report.overall_risk_score.abs() < f64::EPSILON);
    assert_eq!(report.risk_level, RiskLevel::Low);
    assert_eq!(report.recommendations, [HEALTHY_DISTRIBUTION]);

    let factors = report.factors().unwrap();
    assert!((factors.concentration.distribution.top_1_percentage - 20.0).abs() < 1e-9);
    assert!((factors.concentration.distribution.top_5_percentage - 100.0).abs() < 1e-9);
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
async fn comments_are_split_among_known_participants() {
    let mut issue = IssueRecord::new(1, Some("omar".to_string()), now() - Duration::days(3), false);
    issue.comments = 9;
    issue.participants = vec!["maya".to_string(), "lena".to_string(), "omar".to_string()];

    let mut commits: Vec<_> = (0..5).map(|i| commit("maya", "maya@acme.io", i)).collect();
    commits.extend((0..5).map(|i| commit("lena", "lena@acme.io", i)));

    let source = InMemorySource::default().with(
        "acme/talk",
        Activity {
            commits,
            issues: vec![issue],
        },
    );

    let factors = analyzer(source)
        .analyze("acme/talk", AnalysisWindow::new(now(), 30), false)
        .await
        .unwrap();

    let ranked = &factors.concentration.ranked;
    let comments_of = |login: &str| ranked.iter().find(|e| e.login == login).unwrap().comments_made;
    assert_eq!(comments_of("maya"), 3);
    assert_eq!(comments_of("lena"), 3);
    assert_eq!(comments_of("omar"), 3);
    assert_eq!(factors.concentration.total_activity, 5 + 5 + 1 + 9);
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
async fn slow_pull_requests_raise_security_warning() {
    let mut pr = IssueRecord::new(7, Some("lena".to_string()), now() - Duration::days(10), true);
    pr.closed = true;
    pr.closed_at = Some(now() - Duration::days(4));
    pr.reviews = vec![ReviewRecord::new(Some("maya")), ReviewRecord::new(Some("lena"))];

    let source = InMemorySource::default().with(
        "acme/slow",
        Activity {
            commits: (0..4).map(|i| commit("maya", "maya@gmail.com", i)).collect(),
            issues: vec![pr],
        },
    );

    let reports = analyzer(source)
        .analyze_batch(&AnalysisRequest::new(vec!["acme/slow".to_string()], 30), now())
        .await
        .unwrap();

    let factors = reports[0].factors().unwrap();
    assert_eq!(factors.statistics.total_prs, 1);
    assert_eq!(factors.statistics.closed_prs, 1);

    let maya = factors.concentration.ranked.iter().find(|e| e.login == "maya").unwrap();
    assert_eq!(maya.reviews_given, 1);

    // self-reviews are not credited
    let lena = factors.concentration.ranked.iter().find(|e| e.login == "lena").unwrap();
    assert_eq!(lena.reviews_given, 0);
    assert_eq!(lena.prs_created, 1);

    assert!(
        reports[0]
            .recommendations
            .iter()
            .any(|r| r.starts_with("SECURITY RISK") && r.contains("6.0 days"))
    );
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
async fn failed_repository_does_not_fail_batch() {
    let healthy = Activity {
        commits: ["maya", "lena", "omar", "priya", "jonas"]
            .into_iter()
            .flat_map(|login| commits_over_year(login, &format!("{login}@gmail.com"), 4))
            .collect(),
        ..Activity::default()
    };

    let source = InMemorySource::default()
        .with("acme/one", healthy.clone())
        .with("acme/three", healthy);

    let request = AnalysisRequest::new(
        vec![
            "acme/one".to_string(),
            "https://github.com/acme/missing".to_string(),
            "github.com/acme/three".to_string(),
        ],
        365,
    );

    let reports = analyzer(source).analyze_batch(&request, now()).await.unwrap();
    assert_eq!(reports.len(), 3);

    assert_eq!(reports[0].repository, "acme/one");
    assert_eq!(reports[0].risk_level, RiskLevel::Low);

    let failed = &reports[1];
    assert_eq!(failed.repository, "https://github.com/acme/missing");
    assert!((failed.overall_risk_score - 1.0).abs() < f64::EPSILON);
    assert_eq!(failed.risk_level, RiskLevel::High);
    assert_eq!(failed.recommendations, [UNABLE_TO_ANALYZE]);
    assert!(matches!(&failed.outcome, AnalysisOutcome::Failed { error } if error.contains("not found")));

    assert_eq!(reports[2].repository, "github.com/acme/three");
    assert!(reports[2].factors().is_some());

    let mut json = String::new();
    generate_json(&reports, &mut json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["summary"]["total_repositories"], 3);
    assert!(value["analyses"][1]["key_risk_factors"]["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
async fn malformed_identifier_yields_failed_report() {
    let reports = analyzer(InMemorySource::default())
        .analyze_batch(&AnalysisRequest::new(vec!["not a repository".to_string()], 30), now())
        .await
        .unwrap();

    assert!(matches!(reports[0].outcome, AnalysisOutcome::Failed { .. }));
    assert_eq!(reports[0].risk_level, RiskLevel::High);
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
async fn user_config_keeps_builtin_identity_lists() {
    let dir = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    std::fs::write(base.join(CONFIG_FILE_NAME), "analysis_days = 90\n[identity]\ncustom_domains = [\"acme.io\"]\n").unwrap();

    let config = Config::load(&base, None).unwrap();
    assert_eq!(config.analysis_days, 90);

    let mut commits: Vec<_> = (0..6).map(|i| commit("maya", "maya@google.com", i)).collect();
    commits.extend((0..4).map(|i| commit("lena", "lena@acme.io", i)));
    commits.extend((0..5).map(|i| commit("ci-runner", "runner@example.com", i)));
    commits.extend((0..3).map(|i| commit("renovate", "renovate@example.com", i)));

    let source = InMemorySource::default().with(
        "acme/configured",
        Activity {
            commits,
            ..Activity::default()
        },
    );

    let factors = analyzer_with_config(source, &config)
        .analyze("acme/configured", AnalysisWindow::new(now(), config.analysis_days), false)
        .await
        .unwrap();

    let logins: Vec<_> = factors.concentration.ranked.iter().map(|e| e.login.as_str()).collect();
    assert_eq!(logins, ["maya", "lena"]);
    assert_eq!(factors.bots_filtered, 8);

    let ranked = &factors.concentration.ranked;
    assert_eq!(ranked[0].email_category, EmailCategory::Company);
    assert_eq!(ranked[1].email_category, EmailCategory::Custom);
}
