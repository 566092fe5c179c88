use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::{IntoAppError, bail};
use std::sync::Arc;
use url::Url;

const GITHUB_HOSTS: &[&str] = &["github.com", "www.github.com"];

/// A GitHub repository, identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSpec {
    owner: Arc<str>,
    repo: Arc<str>,
}

impl RepoSpec {
    /// Parse `owner/repo`, `github.com/owner/repo`, or a full repository URL.
    ///
    /// A trailing `.git` and trailing slashes are ignored, as are path segments after the repository name.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("empty repository identifier");
        }

        let url_text = if trimmed.contains("://") {
            trimmed.to_string()
        } else if GITHUB_HOSTS.iter().any(|host| trimmed.starts_with(&format!("{host}/"))) {
            format!("https://{trimmed}")
        } else {
            format!("https://github.com/{trimmed}")
        };

        let url = Url::parse(&url_text).into_app_err_with(|| format!("invalid repository identifier '{input}'"))?;
        Self::from_url(&url)
    }

    /// Extract owner and repository name from a GitHub URL.
    pub fn from_url(url: &Url) -> Result<Self> {
        let host = url.host_str().unwrap_or_default();
        if !GITHUB_HOSTS.contains(&host) {
            bail!("unsupported repository host '{host}' in {url}, only GitHub repositories can be analyzed");
        }

        let path_segments: Vec<_> = url.path_segments().map(Iterator::collect).unwrap_or_default();
        let (Some(owner), Some(repo)) = (path_segments.first(), path_segments.get(1)) else {
            bail!("invalid repository URL format, expected owner/repo: {url}");
        };

        let repo = repo.trim_end_matches(".git");
        if owner.is_empty() || repo.is_empty() {
            bail!("invalid repository URL: empty owner or repo name: {url}");
        }

        Ok(Self {
            owner: Arc::from(*owner),
            repo: Arc::from(repo),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
