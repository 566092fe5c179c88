use super::aggregator::{ActivityAggregator, AggregatedActivity};
use super::concentration::assess;
use super::identity::IdentityClassifier;
use super::ledger::ContributorLedger;
use super::risk::{RiskFactors, RiskReport};
use super::sentiment::{MIN_ACTIVITY_FOR_SENTIMENT, SentimentScorer, SentimentSummary, summarize};
use super::statistics;
use super::trend::apply_trends;
use super::window::{AnalysisWindow, MAX_WINDOW_DAYS};
use crate::Result;
use crate::facts::{ActivitySource, CommitRecord, IssueRecord, RepoSpec, Throttler};
use chrono::{DateTime, Utc};
use core::time::Duration;
use futures_util::future::join_all;
use ohno::{EnrichableExt, bail};
use std::collections::HashMap;

const LOG_TARGET: &str = "  analyzer";

/// Reject look-back windows outside `1..=365` days.
pub fn validate_window_days(days: u32) -> Result<()> {
    if days == 0 || days > MAX_WINDOW_DAYS {
        bail!("analysis window must be between 1 and {MAX_WINDOW_DAYS} days, got {days}");
    }
    Ok(())
}

/// A batch of repositories to analyze over a common window.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub repositories: Vec<String>,
    pub days: u32,
    pub include_sentiment: bool,
}

impl AnalysisRequest {
    #[must_use]
    pub const fn new(repositories: Vec<String>, days: u32) -> Self {
        Self {
            repositories,
            days,
            include_sentiment: false,
        }
    }

    #[must_use]
    pub const fn with_sentiment(mut self, include_sentiment: bool) -> Self {
        self.include_sentiment = include_sentiment;
        self
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    /// Most messages scored per contributor
    pub sentiment_sample_size: usize,

    /// Most contributors whose messages are sampled at the same time
    pub max_concurrent_sentiment_lookups: usize,

    /// Per-repository limit when sentiment is skipped
    pub timeout: Duration,

    /// Per-repository limit when sentiment is sampled
    pub sentiment_timeout: Duration,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            sentiment_sample_size: 30,
            max_concurrent_sentiment_lookups: 4,
            timeout: Duration::from_secs(45),
            sentiment_timeout: Duration::from_secs(120),
        }
    }
}

/// Runs the fetch, aggregate, score, and synthesize pipeline for each repository.
#[derive(Debug)]
pub struct Analyzer<S, C> {
    source: S,
    scorer: C,
    classifier: IdentityClassifier,
    settings: AnalyzerSettings,
}

impl<S: ActivitySource, C: SentimentScorer> Analyzer<S, C> {
    #[must_use]
    pub const fn new(source: S, scorer: C, classifier: IdentityClassifier, settings: AnalyzerSettings) -> Self {
        Self {
            source,
            scorer,
            classifier,
            settings,
        }
    }

    /// Analyze every repository of the request concurrently.
    ///
    /// Only an invalid window fails the whole batch. A repository that cannot be analyzed,
    /// or that runs past its time limit, still yields a report, in request order.
    pub async fn analyze_batch(&self, request: &AnalysisRequest, now: DateTime<Utc>) -> Result<Vec<RiskReport>> {
        validate_window_days(request.days)?;

        let window = AnalysisWindow::new(now, request.days);
        let timeout = if request.include_sentiment {
            self.settings.sentiment_timeout
        } else {
            self.settings.timeout
        };

        log::info!(
            target: LOG_TARGET,
            "Analyzing {} repositories over the last {} days",
            request.repositories.len(),
            request.days
        );

        Ok(join_all(
            request
                .repositories
                .iter()
                .map(|repository| self.analyze_with_timeout(repository, window, request.include_sentiment, timeout)),
        )
        .await)
    }

    async fn analyze_with_timeout(&self, repository: &str, window: AnalysisWindow, include_sentiment: bool, timeout: Duration) -> RiskReport {
        let analysis_date = window.now();

        match tokio::time::timeout(timeout, self.analyze(repository, window, include_sentiment)).await {
            Ok(Ok(factors)) => RiskReport::complete(repository, factors, analysis_date),
            Ok(Err(e)) => {
                log::warn!(target: LOG_TARGET, "Could not analyze '{repository}': {e:#}");
                RiskReport::failed(repository, &e, analysis_date)
            }
            Err(_elapsed) => {
                log::warn!(target: LOG_TARGET, "Analysis of '{repository}' timed out after {}s", timeout.as_secs());
                RiskReport::timed_out(repository, timeout, analysis_date)
            }
        }
    }

    /// Analyze a single repository.
    ///
    /// Fails on a malformed identifier, an out-of-range window, or when the repository metadata
    /// cannot be fetched. Commit and issue fetch failures only reduce the data analyzed.
    pub async fn analyze(&self, repository: &str, window: AnalysisWindow, include_sentiment: bool) -> Result<RiskFactors> {
        validate_window_days(window.days())?;
        let repo = RepoSpec::parse(repository)?;

        let info = self
            .source
            .repository_info(&repo)
            .await
            .map_err(|e| e.enrich_with(|| format!("fetching metadata for repository '{repo}'")))?;

        let commits: Vec<CommitRecord> = self
            .source
            .commits(&repo, window)
            .await
            .unwrap_or_else(|e| {
                log::warn!(target: LOG_TARGET, "Could not fetch commits for '{repo}', continuing without them: {e:#}");
                Vec::new()
            })
            .into_iter()
            .filter(|commit| window.contains(commit.authored_at))
            .collect();

        let issues: Vec<IssueRecord> = self
            .source
            .issues(&repo, window)
            .await
            .unwrap_or_else(|e| {
                log::warn!(target: LOG_TARGET, "Could not fetch issues for '{repo}', continuing without them: {e:#}");
                Vec::new()
            })
            .into_iter()
            .filter(|issue| window.contains(issue.created_at))
            .collect();

        log::debug!(
            target: LOG_TARGET,
            "'{repo}': {} commits and {} issues or pull requests in window",
            commits.len(),
            issues.len()
        );

        let mut aggregator = ActivityAggregator::new(&self.classifier, window);
        aggregator.add_commits(&commits);
        aggregator.add_issues(&issues);
        let AggregatedActivity { mut ledger, bots_filtered } = aggregator.finish();

        apply_trends(&mut ledger);

        if include_sentiment {
            self.attach_sentiment(&repo, window, &mut ledger).await;
        }

        let total_commits = u32::try_from(commits.len()).unwrap_or(u32::MAX);
        let statistics = statistics::compute(&issues, total_commits, window.days());
        let concentration = assess(ledger.into_entries());

        log::info!(
            target: LOG_TARGET,
            "'{repo}': {} active contributors, concentration risk {:.3}",
            concentration.ranked.len(),
            concentration.risk
        );

        Ok(RiskFactors {
            concentration,
            statistics,
            repository: info,
            recent_commits_analyzed: commits.len(),
            recent_issues_analyzed: issues.len(),
            bots_filtered,
        })
    }

    /// Sample and score messages for every sufficiently active contributor.
    ///
    /// Summaries are gathered first and only then written into the ledger.
    async fn attach_sentiment(&self, repo: &RepoSpec, window: AnalysisWindow, ledger: &mut ContributorLedger) {
        let eligible: Vec<String> = ledger
            .iter()
            .filter(|entry| entry.total_activity() >= MIN_ACTIVITY_FOR_SENTIMENT)
            .map(|entry| entry.login.clone())
            .collect();

        let throttler = Throttler::new(self.settings.max_concurrent_sentiment_lookups.max(1));
        let summaries = join_all(eligible.iter().map(|login| {
            let throttler = &throttler;
            async move {
                let _permit = throttler.acquire().await;
                self.sample_sentiment(repo, login, window).await
            }
        }))
        .await;

        let mut by_login: HashMap<String, SentimentSummary> = eligible.into_iter().zip(summaries).collect();
        for entry in ledger.iter_mut() {
            entry.sentiment = Some(by_login.remove(&entry.login).unwrap_or_else(SentimentSummary::insufficient_activity));
        }
    }

    async fn sample_sentiment(&self, repo: &RepoSpec, login: &str, window: AnalysisWindow) -> SentimentSummary {
        let limit = self.settings.sentiment_sample_size;

        match self.source.contributor_messages(repo, login, window, limit).await {
            Ok(mut messages) => {
                messages.truncate(limit);
                summarize(&self.scorer, &messages)
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not sample messages by '{login}' in '{repo}': {e:#}");
                SentimentSummary::no_recent_comments()
            }
        }
    }
}
