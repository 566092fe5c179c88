//! Typed activity records produced by an [`ActivitySource`](super::ActivitySource).

use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use strum::Display as StrumDisplay;

/// A commit within the analysis window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub sha: String,

    /// Login of the linked hosting account, when the commit email maps to one
    pub author_login: Option<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub authored_at: DateTime<Utc>,
}

/// A review left on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewRecord {
    pub reviewer_login: Option<String>,
}

impl ReviewRecord {
    #[must_use]
    pub fn new(reviewer_login: Option<&str>) -> Self {
        Self {
            reviewer_login: reviewer_login.map(str::to_string),
        }
    }
}

/// An issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub number: u64,
    pub author_login: Option<String>,
    pub created_at: DateTime<Utc>,

    /// Whether the hosting service reports the item as closed
    pub closed: bool,

    /// `None` when open, or when the closing timestamp was missing or malformed
    pub closed_at: Option<DateTime<Utc>>,

    pub is_pull_request: bool,

    /// Number of comments reported by the hosting service
    pub comments: u32,

    /// Distinct logins that took part in the discussion
    pub participants: Vec<String>,

    /// Reviews, for pull requests only
    pub reviews: Vec<ReviewRecord>,
}

impl IssueRecord {
    #[must_use]
    pub const fn new(number: u64, author_login: Option<String>, created_at: DateTime<Utc>, is_pull_request: bool) -> Self {
        Self {
            number,
            author_login,
            created_at,
            closed: false,
            closed_at: None,
            is_pull_request,
            comments: 0,
            participants: Vec::new(),
            reviews: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed || self.closed_at.is_some()
    }
}

/// Where a contributor message was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Commit,
    IssueComment,
    PrComment,
    PrReview,
    PrLineComment,
}

/// A piece of text written by a contributor, used for sentiment sampling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorMessage {
    kind: MessageKind,
    body: String,
}

impl ContributorMessage {
    #[must_use]
    pub fn new(kind: MessageKind, body: impl Into<String>) -> Self {
        Self { kind, body: body.into() }
    }

    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// The message text without its kind label.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Display for ContributorMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.kind, self.body)
    }
}

/// Repository metadata returned by the primary fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepositoryInfo {
    pub full_name: String,
    pub description: Option<String>,
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub open_issues: Option<u64>,
}
