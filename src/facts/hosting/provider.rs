use super::client::{self, Client, HostingApiResult, TIMELINE_ACCEPT, has_next_page, parse_timestamp};
use crate::Result;
use crate::analysis::AnalysisWindow;
use crate::facts::throttler::Throttler;
use crate::facts::{
    ActivitySource, CommitRecord, ContributorMessage, IssueRecord, MessageKind, RepoSpec, RepositoryInfo, ReviewRecord,
};
use chrono::SecondsFormat;
use core::time::Duration;
use futures_util::future::join_all;
use ohno::{EnrichableExt, IntoAppError, bail};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;

const LOG_TARGET: &str = "    github";
const PAGE_SIZE: usize = 100;
const MAX_COMMITS: usize = 500;
const MAX_ISSUES: usize = 200;
const MESSAGE_COMMIT_PAGE_SIZE: usize = 50;
const MAX_PAGES: u32 = 10;

/// Public GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// One page of a list endpoint
struct Page<T> {
    items: T,
    has_next: bool,
}

/// Something a contributor wrote on an issue or pull request.
trait Authored {
    fn author(&self) -> Option<&str>;
    fn body(&self) -> Option<&str>;
    fn written_at(&self) -> Option<&str>;
}

impl Authored for client::Comment {
    fn author(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.login.as_deref())
    }

    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    fn written_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

impl Authored for client::Review {
    fn author(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.login.as_deref())
    }

    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    fn written_at(&self) -> Option<&str> {
        self.submitted_at.as_deref()
    }
}

/// [`ActivitySource`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubSource {
    client: Client,
    throttler: Arc<Throttler>,
}

impl GitHubSource {
    pub fn new(token: Option<&str>, base_url: &str, max_concurrent_requests: usize, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::new(token, base_url, request_timeout)?,
            throttler: Throttler::new(max_concurrent_requests.max(1)),
        })
    }

    /// Construct API URL for a repository with optional path suffix
    fn repo_url(&self, repo: &RepoSpec, suffix: &str) -> String {
        format!("{}/repos/{}/{}{suffix}", self.client.base_url(), repo.owner(), repo.repo())
    }

    /// Issue a throttled request; `Ok(None)` means the resource does not exist.
    async fn request(&self, url: &str, accept: Option<&str>) -> Result<Option<reqwest::Response>> {
        let result = {
            let _permit = self.throttler.acquire().await;
            self.client.api_call(url, accept).await
        };

        match result {
            HostingApiResult::Success(resp, rate_limit) => {
                if let Some(rl) = rate_limit {
                    log::trace!(target: LOG_TARGET, "{} API requests remaining, reset at {}", rl.remaining, rl.reset_at);
                }
                Ok(Some(resp))
            }
            HostingApiResult::RateLimited(rate_limit) => {
                if let Some(resume_at) = self.throttler.pause_until_reset(rate_limit.reset_at) {
                    log::warn!(
                        target: LOG_TARGET,
                        "Hit GitHub rate limit, pausing requests until {}",
                        resume_at.with_timezone(&chrono::Local).format("%T")
                    );
                }
                bail!("GitHub API rate limit exceeded while requesting {url}")
            }
            HostingApiResult::NotFound => Ok(None),
            HostingApiResult::Failed(e) => Err(e.enrich_with(|| format!("requesting {url}"))),
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, accept: Option<&str>) -> Result<Page<T>> {
        let Some(resp) = self.request(url, accept).await? else {
            bail!("resource not found: {url}");
        };

        let has_next = has_next_page(resp.headers());
        let items = resp.json::<T>().await.into_app_err_with(|| format!("decoding response from {url}"))?;
        Ok(Page { items, has_next })
    }

    /// Follow pagination until `max_items` have been collected or the pages run out.
    async fn paginate<T: DeserializeOwned>(&self, url: &str, max_items: usize) -> Result<Vec<T>> {
        let separator = if url.contains('?') { '&' } else { '?' };
        let mut all_items = Vec::new();
        let mut page_num = 1_u32;

        loop {
            let page_url = format!("{url}{separator}per_page={PAGE_SIZE}&page={page_num}");
            let Page { items, has_next } = self.get::<Vec<T>>(&page_url, None).await?;

            let short_page = items.len() < PAGE_SIZE;
            all_items.extend(items);

            if short_page || !has_next || all_items.len() >= max_items {
                break;
            }

            page_num += 1;
            if page_num > MAX_PAGES {
                log::debug!(target: LOG_TARGET, "Reached maximum page limit ({MAX_PAGES}) for {url}");
                break;
            }
        }

        all_items.truncate(max_items);
        Ok(all_items)
    }

    /// Fetch reviews and timeline participants for a pull request.
    ///
    /// Either lookup failing leaves the corresponding list empty.
    async fn add_review_details(&self, repo: &RepoSpec, mut record: IssueRecord) -> IssueRecord {
        if !record.is_pull_request {
            return record;
        }

        let number = record.number;

        let reviews_url = self.repo_url(repo, &format!("/pulls/{number}/reviews"));
        match self.get::<Vec<client::Review>>(&reviews_url, None).await {
            Ok(page) => {
                record.reviews = page
                    .items
                    .into_iter()
                    .map(|review| ReviewRecord {
                        reviewer_login: review.user.and_then(|u| u.login),
                    })
                    .collect();
            }
            Err(e) => log::debug!(target: LOG_TARGET, "Could not fetch reviews for {repo}#{number}: {e:#}"),
        }

        let timeline_url = self.repo_url(repo, &format!("/issues/{number}/timeline"));
        match self.get::<Vec<client::TimelineEvent>>(&timeline_url, Some(TIMELINE_ACCEPT)).await {
            Ok(page) => {
                record.participants = distinct(page.items.into_iter().filter_map(|event| event.actor.and_then(|a| a.login)));
            }
            Err(e) => log::debug!(target: LOG_TARGET, "Could not fetch timeline for {repo}#{number}: {e:#}"),
        }

        record
    }

    /// Collect everything `login` wrote at `url` within the window.
    async fn fetch_authored<T: DeserializeOwned + Authored>(
        &self,
        url: &str,
        login: &str,
        window: AnalysisWindow,
        kind: MessageKind,
    ) -> Vec<ContributorMessage> {
        let items = match self.get::<Vec<T>>(url, None).await {
            Ok(page) => page.items,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Skipping {kind} messages from {url}: {e:#}");
                return Vec::new();
            }
        };

        items
            .iter()
            .filter(|item| item.author() == Some(login))
            .filter(|item| parse_timestamp(item.written_at()).is_some_and(|ts| window.contains(ts)))
            .filter_map(|item| item.body().map(str::trim).filter(|body| !body.is_empty()))
            .map(|body| ContributorMessage::new(kind, body))
            .collect()
    }
}

impl ActivitySource for GitHubSource {
    async fn repository_info(&self, repo: &RepoSpec) -> Result<RepositoryInfo> {
        let url = self.repo_url(repo, "");

        let Some(resp) = self.request(&url, None).await? else {
            bail!("repository '{repo}' not found");
        };

        let info: client::Repository = resp
            .json()
            .await
            .into_app_err_with(|| format!("decoding repository metadata for '{repo}'"))?;

        Ok(RepositoryInfo {
            full_name: info.full_name.unwrap_or_else(|| repo.to_string()),
            description: info.description,
            stars: info.stargazers_count,
            forks: info.forks_count,
            open_issues: info.open_issues_count,
        })
    }

    async fn commits(&self, repo: &RepoSpec, window: AnalysisWindow) -> Result<Vec<CommitRecord>> {
        let since = window.start().to_rfc3339_opts(SecondsFormat::Secs, true);
        let url = self.repo_url(repo, &format!("/commits?since={since}"));

        let commits: Vec<client::Commit> = self.paginate(&url, MAX_COMMITS).await?;
        log::info!(target: LOG_TARGET, "Fetched {} commits for '{repo}'", commits.len());

        Ok(commits.into_iter().filter_map(to_commit_record).collect())
    }

    async fn issues(&self, repo: &RepoSpec, window: AnalysisWindow) -> Result<Vec<IssueRecord>> {
        let since = window.start().to_rfc3339_opts(SecondsFormat::Secs, true);
        let url = self.repo_url(repo, &format!("/issues?state=all&since={since}"));

        let issues: Vec<client::Issue> = self.paginate(&url, MAX_ISSUES).await?;
        log::info!(target: LOG_TARGET, "Fetched {} issues and pull requests for '{repo}'", issues.len());

        let records = issues
            .into_iter()
            .filter_map(to_issue_record)
            .filter(|record| window.contains(record.created_at));

        Ok(join_all(records.map(|record| self.add_review_details(repo, record))).await)
    }

    async fn contributor_messages(
        &self,
        repo: &RepoSpec,
        login: &str,
        window: AnalysisWindow,
        limit: usize,
    ) -> Result<Vec<ContributorMessage>> {
        if !self.client.has_token() {
            log::info!(target: LOG_TARGET, "No GitHub token available, skipping message sampling for '{login}'");
            return Ok(Vec::new());
        }

        let since = window.start().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut messages = Vec::new();

        let commits_url = self.repo_url(
            repo,
            &format!("/commits?author={login}&per_page={MESSAGE_COMMIT_PAGE_SIZE}&since={since}"),
        );
        match self.get::<Vec<client::Commit>>(&commits_url, None).await {
            Ok(page) => messages.extend(
                page.items
                    .iter()
                    .filter_map(|commit| commit_headline(&commit.commit.message))
                    .map(|line| ContributorMessage::new(MessageKind::Commit, line)),
            ),
            Err(e) => log::debug!(target: LOG_TARGET, "Could not fetch commits by '{login}' in '{repo}': {e:#}"),
        }

        let issues_url = self.repo_url(
            repo,
            &format!("/issues?state=all&sort=updated&direction=desc&per_page={PAGE_SIZE}&since={since}"),
        );
        let issues = self
            .get::<Vec<client::Issue>>(&issues_url, None)
            .await
            .map(|page| page.items)
            .unwrap_or_else(|e| {
                log::debug!(target: LOG_TARGET, "Could not list issues of '{repo}' for message sampling: {e:#}");
                Vec::new()
            });

        for issue in issues {
            if messages.len() >= limit {
                break;
            }

            let number = issue.number;
            let is_pr = issue.pull_request.is_some();

            if issue.comments > 0 {
                let kind = if is_pr { MessageKind::PrComment } else { MessageKind::IssueComment };
                let url = self.repo_url(repo, &format!("/issues/{number}/comments"));
                messages.extend(self.fetch_authored::<client::Comment>(&url, login, window, kind).await);
            }

            if is_pr {
                let url = self.repo_url(repo, &format!("/pulls/{number}/reviews"));
                messages.extend(self.fetch_authored::<client::Review>(&url, login, window, MessageKind::PrReview).await);

                let url = self.repo_url(repo, &format!("/pulls/{number}/comments"));
                messages.extend(self.fetch_authored::<client::Comment>(&url, login, window, MessageKind::PrLineComment).await);
            }
        }

        messages.truncate(limit);
        log::debug!(target: LOG_TARGET, "Sampled {} messages by '{login}' in '{repo}'", messages.len());
        Ok(messages)
    }
}

fn to_commit_record(commit: client::Commit) -> Option<CommitRecord> {
    let git_author = commit.commit.author;
    let Some(authored_at) = parse_timestamp(git_author.as_ref().and_then(|a| a.date.as_deref())) else {
        log::debug!(target: LOG_TARGET, "Dropping commit {} with a missing or malformed date", commit.sha);
        return None;
    };

    let (author_name, author_email) = git_author.map(|a| (a.name, a.email)).unwrap_or_default();

    Some(CommitRecord {
        sha: commit.sha,
        author_login: commit.author.and_then(|u| u.login),
        author_name,
        author_email,
        authored_at,
    })
}

fn to_issue_record(issue: client::Issue) -> Option<IssueRecord> {
    let Some(created_at) = parse_timestamp(issue.created_at.as_deref()) else {
        log::debug!(target: LOG_TARGET, "Dropping issue #{} with a missing or malformed creation date", issue.number);
        return None;
    };

    let is_pull_request = issue.pull_request.is_some();
    let author_login = issue.user.and_then(|u| u.login);

    let mut record = IssueRecord::new(issue.number, author_login.clone(), created_at, is_pull_request);
    record.closed = issue.state == "closed";
    record.closed_at = parse_timestamp(issue.closed_at.as_deref());
    record.comments = issue.comments;

    if !is_pull_request {
        // plain issues approximate participants with the author and assignees
        record.participants = distinct(author_login.into_iter().chain(issue.assignees.into_iter().filter_map(|u| u.login)));
    }

    Some(record)
}

/// First line of a commit message, unless it is a merge commit.
fn commit_headline(message: &str) -> Option<&str> {
    let first_line = message.lines().next()?.trim();
    (!first_line.is_empty() && !first_line.starts_with("Merge ")).then_some(first_line)
}

/// Drop duplicates while keeping first-seen order.
fn distinct(logins: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    logins.into_iter().filter(|login| seen.insert(login.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};

    fn issue(json: &str) -> client::Issue {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_commit_headline() {
        assert_eq!(commit_headline("Fix parser\n\nDetails"), Some("Fix parser"));
        assert_eq!(commit_headline("  Trim me  "), Some("Trim me"));
        assert_eq!(commit_headline("Merge pull request #12 from x/y"), None);
        assert_eq!(commit_headline(""), None);
        assert_eq!(commit_headline("\nsecond line only"), None);
    }

    #[test]
    fn test_distinct_keeps_order() {
        let logins = ["b", "a", "b", "c", "a"].map(str::to_string);
        assert_eq!(distinct(logins), ["b", "a", "c"]);
    }

    #[test]
    fn test_to_issue_record_plain_issue_participants() {
        let record = to_issue_record(issue(
            r#"{
                "number": 1,
                "user": { "login": "alice" },
                "created_at": "2024-05-01T00:00:00Z",
                "closed_at": "2024-05-03T00:00:00Z",
                "state": "closed",
                "comments": 2,
                "assignees": [{ "login": "bob" }, { "login": "alice" }]
            }"#,
        ))
        .unwrap();

        assert!(!record.is_pull_request);
        assert!(record.closed);
        assert!(record.closed_at.is_some());
        assert_eq!(record.comments, 2);
        assert_eq!(record.participants, ["alice", "bob"]);
    }

    #[test]
    fn test_to_issue_record_pull_request_has_no_participants_yet() {
        let record = to_issue_record(issue(
            r#"{
                "number": 2,
                "user": { "login": "alice" },
                "created_at": "2024-05-01T00:00:00Z",
                "state": "open",
                "pull_request": {}
            }"#,
        ))
        .unwrap();

        assert!(record.is_pull_request);
        assert!(record.participants.is_empty());
        assert!(!record.is_closed());
    }

    #[test]
    fn test_to_issue_record_drops_malformed_dates() {
        let record = to_issue_record(issue(r#"{ "number": 3, "created_at": "last tuesday", "state": "open" }"#));
        assert!(record.is_none());
    }

    #[test]
    fn test_to_issue_record_keeps_closed_state_with_bad_close_date() {
        let record = to_issue_record(issue(
            r#"{ "number": 4, "created_at": "2024-05-01T00:00:00Z", "closed_at": "soon", "state": "closed" }"#,
        ))
        .unwrap();

        assert!(record.closed);
        assert!(record.closed_at.is_none());
        assert!(record.is_closed());
    }

    #[test]
    fn test_to_commit_record() {
        let commit: client::Commit = serde_json::from_str(
            r#"{
                "sha": "abc",
                "author": { "login": "alice" },
                "commit": { "author": { "name": "Alice", "email": "alice@gmail.com", "date": "2024-01-01T00:00:00Z" }, "message": "x" }
            }"#,
        )
        .unwrap();

        let record = to_commit_record(commit).unwrap();
        assert_eq!(record.author_login.as_deref(), Some("alice"));
        assert_eq!(record.author_email.as_deref(), Some("alice@gmail.com"));
    }

    #[test]
    fn test_to_commit_record_without_date() {
        let commit: client::Commit = serde_json::from_str(r#"{ "sha": "abc", "commit": { "message": "x" } }"#).unwrap();
        assert!(to_commit_record(commit).is_none());
    }

    #[test]
    fn test_authored_comment_accessors() {
        let comment: client::Comment =
            serde_json::from_str(r#"{ "user": { "login": "alice" }, "body": "hi", "created_at": "2024-01-01T00:00:00Z" }"#).unwrap();
        assert_eq!(comment.author(), Some("alice"));
        assert_eq!(Authored::body(&comment), Some("hi"));

        let now = DateTime::parse_from_rfc3339("2024-01-10T00:00:00Z").unwrap().to_utc();
        let window = AnalysisWindow::new(now, 30);
        assert!(parse_timestamp(comment.written_at()).is_some_and(|ts| window.contains(ts)));
        assert!(!window.contains(now - ChronoDuration::days(31)));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
    async fn test_repo_url() {
        let source = GitHubSource::new(None, "https://api.github.com/", 2, Duration::from_secs(5)).unwrap();
        let repo = RepoSpec::parse("owner/name").unwrap();
        assert_eq!(source.repo_url(&repo, "/commits"), "https://api.github.com/repos/owner/name/commits");
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call CreateIoCompletionPort on Windows")]
    async fn test_contributor_messages_without_token_is_empty() {
        let source = GitHubSource::new(None, "http://127.0.0.1:9", 2, Duration::from_secs(1)).unwrap();
        let repo = RepoSpec::parse("owner/name").unwrap();
        let window = AnalysisWindow::new(Utc::now(), 30);

        let messages = source.contributor_messages(&repo, "alice", window, 30).await.unwrap();
        assert!(messages.is_empty());
    }
}
