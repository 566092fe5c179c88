//! Activity collection for hosted repositories
//!
//! An [`ActivitySource`] turns a [`RepoSpec`] into typed records: repository metadata, commits,
//! issues and pull requests with their reviews, and text samples written by a single contributor.
//! [`GitHubSource`] implements it against the GitHub REST API, sharing a [`Throttler`] across
//! all requests so that a rate-limit response pauses every pending lookup.
//!
//! Records carry parsed timestamps. Wire items whose timestamps are missing or malformed are
//! dropped at the boundary and never reach the analysis.

pub(crate) mod hosting;
mod records;
mod repo_spec;
mod throttler;

use crate::Result;
use crate::analysis::AnalysisWindow;

pub use hosting::{DEFAULT_API_URL, GitHubSource};
pub use records::{CommitRecord, ContributorMessage, IssueRecord, MessageKind, RepositoryInfo, ReviewRecord};
pub use repo_spec::RepoSpec;
pub use throttler::Throttler;

/// Where repository activity comes from.
pub trait ActivitySource: Send + Sync {
    /// Repository metadata. Failure here fails the analysis of the repository.
    fn repository_info(&self, repo: &RepoSpec) -> impl Future<Output = Result<RepositoryInfo>> + Send;

    /// Commits since the start of the window.
    fn commits(&self, repo: &RepoSpec, window: AnalysisWindow) -> impl Future<Output = Result<Vec<CommitRecord>>> + Send;

    /// Issues and pull requests, with reviews and participants filled in for pull requests.
    fn issues(&self, repo: &RepoSpec, window: AnalysisWindow) -> impl Future<Output = Result<Vec<IssueRecord>>> + Send;

    /// Up to `limit` recent messages written by `login`.
    fn contributor_messages(
        &self,
        repo: &RepoSpec,
        login: &str,
        window: AnalysisWindow,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ContributorMessage>>> + Send;
}
