//! GitHub API client
//!
//! Minimal GitHub REST client plus the wire types for the few endpoints we read.

use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, LINK};
use serde::Deserialize;
use serde::de::IgnoredAny;

pub const DEFAULT_ACCEPT: &str = "application/vnd.github.v3+json";
pub const TIMELINE_ACCEPT: &str = "application/vnd.github.v3.timeline+json";

#[derive(Debug, Deserialize)]
pub struct User {
    pub login: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Repository {
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub stargazers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub open_issues_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub sha: String,

    /// The linked GitHub account, absent when the commit email maps to no account
    pub author: Option<User>,

    pub commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetail {
    pub author: Option<GitAuthor>,

    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GitAuthor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<String>,
}

/// Issue or pull request as returned by the issues endpoint.
///
/// Timestamps stay textual so that a malformed value only drops the record it belongs to.
#[derive(Debug, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub user: Option<User>,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub comments: u32,

    /// Only present when the issue is really a pull request
    pub pull_request: Option<IgnoredAny>,

    #[serde(default)]
    pub assignees: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct Review {
    pub user: Option<User>,
    pub body: Option<String>,
    pub submitted_at: Option<String>,
}

/// Issue comment or pull request line comment.
#[derive(Debug, Deserialize)]
pub struct Comment {
    pub user: Option<User>,
    pub body: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineEvent {
    pub actor: Option<User>,
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Result of a hosting API call
#[derive(Debug)]
pub enum HostingApiResult<T> {
    /// Request succeeded - contains data and optional rate limit info
    Success(T, Option<RateLimitInfo>),

    /// Rate limited - should retry after reset time
    RateLimited(RateLimitInfo),

    /// The requested resource was not found (404)
    NotFound,

    /// Request failed permanently - should NOT retry
    Failed(ohno::AppError),
}

#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    has_token: bool,
}

impl Client {
    /// Create a new GitHub API client with optional authentication token and base URL
    pub fn new(token: Option<&str>, base_url: impl Into<String>, request_timeout: core::time::Duration) -> crate::Result<Self> {
        use reqwest::header::{AUTHORIZATION, HeaderValue};

        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            has_token: token.is_some(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests are authenticated
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.has_token
    }

    /// Make an API call and classify the result
    pub async fn api_call(&self, url: &str, accept: Option<&str>) -> HostingApiResult<reqwest::Response> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        let resp = match request.send().await {
            Ok(r) => r,
            Err(e) => return HostingApiResult::Failed(e.into()),
        };

        // Extract rate limit info from response headers before checking status
        let rate_limit = extract_rate_limit_from_headers(resp.headers());

        let status = resp.status();
        if status.is_success() {
            return HostingApiResult::Success(resp, rate_limit);
        }

        let status_code = status.as_u16();
        if matches!(status_code, 403 | 429) {
            // Rate limited - use rate limit info from headers or default to 1 hour retry
            let rate_limit = rate_limit.unwrap_or_else(|| RateLimitInfo {
                remaining: 0,
                reset_at: Utc::now() + chrono::Duration::hours(1),
            });
            return HostingApiResult::RateLimited(rate_limit);
        }

        if status_code == 404 {
            return HostingApiResult::NotFound;
        }

        match resp.error_for_status() {
            Ok(_) => HostingApiResult::Failed(ohno::app_err!("unexpected HTTP status {status} from {url}")),
            Err(e) => HostingApiResult::Failed(e.into()),
        }
    }
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

/// Whether the `Link` header advertises another page
pub fn has_next_page(headers: &HeaderMap) -> bool {
    headers
        .get(LINK)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|link_str| link_str.contains(r#"rel="next""#))
}

/// Parse an RFC 3339 timestamp as sent by GitHub
pub fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value?).ok().map(|dt| dt.to_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_repository_deserialize() {
        let json = r#"{
            "full_name": "owner/repo",
            "stargazers_count": 1000,
            "forks_count": 200,
            "open_issues_count": 7
        }"#;

        let repo: Repository = serde_json::from_str(json).unwrap();
        assert_eq!(repo.full_name.as_deref(), Some("owner/repo"));
        assert_eq!(repo.stargazers_count, Some(1000));
        assert_eq!(repo.open_issues_count, Some(7));
        assert_eq!(repo.description, None);
    }

    #[test]
    fn test_commit_deserialize_without_linked_account() {
        let json = r#"{
            "sha": "abc123",
            "author": null,
            "commit": {
                "author": { "name": "Jane", "email": "jane@example.com", "date": "2024-01-01T00:00:00Z" },
                "message": "Fix parser\n\nLonger body"
            }
        }"#;

        let commit: Commit = serde_json::from_str(json).unwrap();
        assert!(commit.author.is_none());
        let author = commit.commit.author.unwrap();
        assert_eq!(author.name.as_deref(), Some("Jane"));
        assert!(commit.commit.message.starts_with("Fix parser"));
    }

    #[test]
    fn test_issue_deserialize() {
        let json = r#"{
            "number": 3,
            "user": { "login": "alice" },
            "created_at": "2024-01-01T00:00:00Z",
            "closed_at": "2024-01-02T00:00:00Z",
            "state": "closed",
            "comments": 4,
            "assignees": [{ "login": "bob" }]
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.state, "closed");
        assert_eq!(issue.comments, 4);
        assert!(issue.pull_request.is_none());
        assert_eq!(issue.assignees.len(), 1);
    }

    #[test]
    fn test_issue_deserialize_with_pull_request() {
        let json = r#"{
            "number": 9,
            "user": null,
            "created_at": "2024-01-01T00:00:00Z",
            "closed_at": null,
            "state": "open",
            "pull_request": { "url": "https://api.github.com/repos/owner/repo/pulls/9" }
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();
        assert!(issue.pull_request.is_some());
        assert!(issue.user.is_none());
        assert_eq!(issue.comments, 0);
    }

    #[test]
    fn test_timeline_event_without_actor() {
        let event: TimelineEvent = serde_json::from_str(r#"{ "event": "committed" }"#).unwrap();
        assert!(event.actor.is_none());
    }

    #[test]
    fn test_extract_rate_limit_from_headers() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4999"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1704067200"));

        let rate_limit = extract_rate_limit_from_headers(&headers).unwrap();

        assert_eq!(rate_limit.remaining, 4999);
        assert_eq!(rate_limit.reset_at.timestamp(), 1_704_067_200);
    }

    #[test]
    fn test_extract_rate_limit_missing_headers() {
        assert!(extract_rate_limit_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_extract_rate_limit_invalid_remaining() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("invalid"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1704067200"));

        assert!(extract_rate_limit_from_headers(&headers).is_none());
    }

    #[test]
    fn test_has_next_page() {
        let mut headers = HeaderMap::new();
        assert!(!has_next_page(&headers));

        let _ = headers.insert(
            LINK,
            HeaderValue::from_static(r#"<https://api.github.com/x?page=2>; rel="next", <https://api.github.com/x?page=5>; rel="last""#),
        );
        assert!(has_next_page(&headers));
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp(Some("2024-01-01T00:00:00Z")).unwrap().timestamp(), 1_704_067_200);
        assert!(parse_timestamp(Some("yesterday")).is_none());
        assert!(parse_timestamp(None).is_none());
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = Client::new(None, "https://api.github.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "https://api.github.com");
        assert!(!client.has_token());
    }

    #[test]
    fn test_client_new_with_token() {
        let client = Client::new(Some("test_token"), "https://api.github.com", Duration::from_secs(5)).unwrap();
        assert!(client.has_token());
    }
}
