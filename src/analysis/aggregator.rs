use super::identity::IdentityClassifier;
use super::ledger::{ActivityKind, ContributorEntry, ContributorLedger};
use super::window::AnalysisWindow;
use crate::facts::{CommitRecord, IssueRecord};

const LOG_TARGET: &str = "aggregator";

/// Result of folding a repository's records into per-contributor counters.
#[derive(Debug, Clone, Default)]
pub struct AggregatedActivity {
    pub ledger: ContributorLedger,

    /// Records and participants skipped because they belonged to automation
    pub bots_filtered: u32,
}

/// Folds window-filtered records into a [`ContributorLedger`].
#[derive(Debug)]
pub struct ActivityAggregator<'a> {
    classifier: &'a IdentityClassifier,
    window: AnalysisWindow,
    activity: AggregatedActivity,
}

impl<'a> ActivityAggregator<'a> {
    #[must_use]
    pub fn new(classifier: &'a IdentityClassifier, window: AnalysisWindow) -> Self {
        Self {
            classifier,
            window,
            activity: AggregatedActivity::default(),
        }
    }

    pub fn add_commits(&mut self, commits: &[CommitRecord]) {
        for commit in commits {
            self.add_commit(commit);
        }
    }

    /// Issues and pull requests, including their reviews and comment participants.
    ///
    /// Comments are only credited to contributors already in the ledger, so issues should be
    /// added after commits.
    pub fn add_issues(&mut self, issues: &[IssueRecord]) {
        for issue in issues {
            self.add_issue(issue);
        }
    }

    #[must_use]
    pub fn finish(self) -> AggregatedActivity {
        self.activity
    }

    fn add_commit(&mut self, commit: &CommitRecord) {
        let name = commit.author_name.as_deref().unwrap_or_default();
        let email = commit.author_email.as_deref().unwrap_or_default();

        let Some(login) = non_empty(commit.author_login.as_deref()).or_else(|| non_empty(commit.author_name.as_deref())) else {
            log::debug!(target: LOG_TARGET, "Skipping commit {} with no identifiable author", commit.sha);
            return;
        };

        if self.classifier.is_bot(login, name, email) {
            self.activity.bots_filtered += 1;
            return;
        }

        let quarter = self.window.quarter_of(commit.authored_at);
        let classifier = self.classifier;

        self.activity
            .ledger
            .get_or_insert_with(login, || {
                let display_name = if name.is_empty() { login } else { name };
                ContributorEntry::from_commit(login, display_name, email, classifier.classify_email(email))
            })
            .record(ActivityKind::Commit, 1, quarter);
    }

    fn add_issue(&mut self, issue: &IssueRecord) {
        let Some(author) = non_empty(issue.author_login.as_deref()) else {
            return;
        };

        if self.classifier.is_bot_login(author) {
            self.activity.bots_filtered += 1;
            return;
        }

        let quarter = self.window.quarter_of(issue.created_at);
        let kind = if issue.is_pull_request {
            ActivityKind::PullRequest
        } else {
            ActivityKind::Issue
        };

        self.activity
            .ledger
            .get_or_insert_with(author, || ContributorEntry::from_login(author))
            .record(kind, 1, quarter);

        for review in &issue.reviews {
            let Some(reviewer) = non_empty(review.reviewer_login.as_deref()) else {
                continue;
            };

            if self.classifier.is_bot_login(reviewer) {
                self.activity.bots_filtered += 1;
                continue;
            }

            if reviewer != author {
                // reviews are bucketed by when the pull request was opened
                self.activity
                    .ledger
                    .get_or_insert_with(reviewer, || ContributorEntry::from_login(reviewer))
                    .record(ActivityKind::Review, 1, quarter);
            }
        }

        self.distribute_comments(issue);
    }

    fn distribute_comments(&mut self, issue: &IssueRecord) {
        if issue.comments == 0 || issue.participants.is_empty() {
            return;
        }

        let humans: Vec<&str> = issue
            .participants
            .iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty() && !self.classifier.is_bot_login(p))
            .collect();

        let Ok(human_count) = u32::try_from(humans.len()) else {
            return;
        };

        if human_count == 0 {
            return;
        }

        let share = (issue.comments / human_count).max(1);
        for participant in humans {
            if let Some(entry) = self.activity.ledger.get_mut(participant) {
                entry.record(ActivityKind::Comment, share, None);
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
