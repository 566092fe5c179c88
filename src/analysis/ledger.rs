use super::identity::EmailCategory;
use super::sentiment::SentimentSummary;
use super::trend::ActivityTrend;
use super::window::QUARTERS;
use std::collections::HashMap;

/// Kinds of contribution tracked per contributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Commit,
    Issue,
    PullRequest,
    Review,
    Comment,
}

/// Everything known about a single human contributor during one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributorEntry {
    pub login: String,
    pub name: String,
    pub email: String,
    pub email_category: EmailCategory,
    pub commits: u32,
    pub issues_created: u32,
    pub prs_created: u32,
    pub reviews_given: u32,
    pub comments_made: u32,

    /// Activity per quarter, index 0 being the oldest quarter
    pub quarterly_activity: [u32; QUARTERS],

    pub trend: ActivityTrend,

    /// `None` when sentiment sampling was not requested
    pub sentiment: Option<SentimentSummary>,
}

impl ContributorEntry {
    /// A contributor first seen through a commit, which carries a display name and email.
    #[must_use]
    pub fn from_commit(login: &str, name: &str, email: &str, email_category: EmailCategory) -> Self {
        Self::blank(login, name, email, email_category)
    }

    /// A contributor first seen through an issue, pull request, or review.
    #[must_use]
    pub fn from_login(login: &str) -> Self {
        Self::blank(login, login, "", EmailCategory::NotApplicable)
    }

    fn blank(login: &str, name: &str, email: &str, email_category: EmailCategory) -> Self {
        Self {
            login: login.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            email_category,
            commits: 0,
            issues_created: 0,
            prs_created: 0,
            reviews_given: 0,
            comments_made: 0,
            quarterly_activity: [0; QUARTERS],
            trend: ActivityTrend::InsufficientData,
            sentiment: None,
        }
    }

    /// Sum of the five activity counters.
    #[must_use]
    pub const fn total_activity(&self) -> u32 {
        self.commits + self.issues_created + self.prs_created + self.reviews_given + self.comments_made
    }

    /// Add `count` contributions of the given kind, optionally landing them in a quarter.
    pub fn record(&mut self, kind: ActivityKind, count: u32, quarter: Option<usize>) {
        let counter = match kind {
            ActivityKind::Commit => &mut self.commits,
            ActivityKind::Issue => &mut self.issues_created,
            ActivityKind::PullRequest => &mut self.prs_created,
            ActivityKind::Review => &mut self.reviews_given,
            ActivityKind::Comment => &mut self.comments_made,
        };
        *counter += count;

        if let Some(slot) = quarter.and_then(|q| self.quarterly_activity.get_mut(q)) {
            *slot += count;
        }
    }
}

/// Insertion-ordered store of contributor entries keyed by login.
#[derive(Debug, Clone, Default)]
pub struct ContributorLedger {
    entries: Vec<ContributorEntry>,
    index: HashMap<String, usize>,
}

impl ContributorLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the entry for `login`, creating it with `make` on first sight.
    pub fn get_or_insert_with(&mut self, login: &str, make: impl FnOnce() -> ContributorEntry) -> &mut ContributorEntry {
        let slot = if let Some(&slot) = self.index.get(login) {
            slot
        } else {
            let slot = self.entries.len();
            self.entries.push(make());
            let _ = self.index.insert(login.to_string(), slot);
            slot
        };

        &mut self.entries[slot]
    }

    #[must_use]
    pub fn get(&self, login: &str) -> Option<&ContributorEntry> {
        self.index.get(login).map(|&slot| &self.entries[slot])
    }

    pub fn get_mut(&mut self, login: &str) -> Option<&mut ContributorEntry> {
        self.index.get(login).map(|&slot| &mut self.entries[slot])
    }

    #[must_use]
    pub fn contains(&self, login: &str) -> bool {
        self.index.contains_key(login)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContributorEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ContributorEntry> {
        self.entries.iter_mut()
    }

    /// Sum of every contributor's total activity.
    #[must_use]
    pub fn total_activity(&self) -> u32 {
        self.entries.iter().map(ContributorEntry::total_activity).sum()
    }

    /// Consume the ledger, yielding entries in first-seen order.
    #[must_use]
    pub fn into_entries(self) -> Vec<ContributorEntry> {
        self.entries
    }
}
