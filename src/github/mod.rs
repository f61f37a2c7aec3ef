pub mod types;

pub use types::{PrUrl, PullRequestData, SearchSlice};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Config;

/// Page size used for file, commit and search pagination.
pub const PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),

    #[error("Pull request {repo}#{number} not found")]
    NotFound { repo: String, number: u64 },

    #[error("Unparseable merge timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("GitHub token not found in config or environment")]
    MissingToken,
}

/// The repository-hosting API seam. The follow-up engine only ever talks to
/// this trait; the real implementation is `GitHubClient`, tests supply a mock.
///
/// Methods return single pages: the pagination policy (fetch until an empty
/// page, search stop conditions) belongs to the callers in `followup`.
/// Implementations must be Send + Sync so candidate evaluation could be moved
/// onto a worker pool without touching the seam.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Fetch PR metadata (title, body, labels, merge timestamp).
    async fn pull_request(&self, repo: &str, number: u64) -> Result<PullRequestData, GitHubError>;

    /// Fetch one page of filenames changed by the PR. Pages start at 1; an
    /// empty page signals exhaustion.
    async fn pr_files_page(
        &self,
        repo: &str,
        number: u64,
        page: u32,
    ) -> Result<Vec<String>, GitHubError>;

    /// Fetch one page of commit messages on the PR. Same paging contract as
    /// `pr_files_page`.
    async fn pr_commits_page(
        &self,
        repo: &str,
        number: u64,
        page: u32,
    ) -> Result<Vec<String>, GitHubError>;

    /// Fetch one page of merged PRs with merge date on or after `since`,
    /// sorted by creation time ascending, together with the reported total.
    async fn search_merged_page(
        &self,
        repo: &str,
        since: NaiveDate,
        page: u32,
    ) -> Result<SearchSlice, GitHubError>;
}

/// Parse a GitHub PR URL into its component parts.
///
/// Expected format: https://github.com/{owner}/{repo}/pull/{number}
pub fn parse_pr_url(url: &str) -> Result<PrUrl, GitHubError> {
    let parsed =
        reqwest::Url::parse(url).map_err(|_| GitHubError::InvalidUrl(url.to_string()))?;

    if parsed.host_str() != Some("github.com") {
        return Err(GitHubError::InvalidUrl(url.to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| GitHubError::InvalidUrl(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "pull" {
        return Err(GitHubError::InvalidUrl(url.to_string()));
    }

    let pr_number = segments[3]
        .parse::<u64>()
        .map_err(|_| GitHubError::InvalidUrl(url.to_string()))?;

    Ok(PrUrl {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}

/// Real GitHub REST client. Thin transport layer: every method is one GET,
/// deserialized into a minimal wire struct and normalized for the engine.
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    api_url: String,
}

impl GitHubClient {
    /// Build a client from config. Fails when no token is available, since
    /// the search endpoint rejects unauthenticated callers almost instantly.
    pub fn new(config: &Config) -> Result<Self, GitHubError> {
        let token = config.github_token().ok_or(GitHubError::MissingToken)?;
        Ok(Self {
            http: reqwest::Client::new(),
            token,
            api_url: config.api_url(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header("User-Agent", "pr-followups")
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    #[instrument(skip(self), fields(repo = %repo, pr = number))]
    async fn pull_request(&self, repo: &str, number: u64) -> Result<PullRequestData, GitHubError> {
        #[derive(serde::Deserialize)]
        struct Label {
            name: String,
        }

        #[derive(serde::Deserialize)]
        struct PullResponse {
            number: u64,
            title: String,
            body: Option<String>,
            labels: Vec<Label>,
            merged_at: Option<String>,
        }

        let url = format!("{}/repos/{}/pulls/{}", self.api_url, repo, number);
        debug!("fetching PR metadata");
        let response = self.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GitHubError::NotFound {
                repo: repo.to_string(),
                number,
            });
        }
        let metadata = response.error_for_status()?.json::<PullResponse>().await?;
        debug!(title = %metadata.title, labels = metadata.labels.len(), "received PR metadata");

        Ok(PullRequestData {
            number: metadata.number,
            title: metadata.title,
            body: metadata.body,
            labels: metadata.labels.into_iter().map(|l| l.name).collect(),
            merged_at: metadata.merged_at,
        })
    }

    #[instrument(skip(self), fields(repo = %repo, pr = number, page))]
    async fn pr_files_page(
        &self,
        repo: &str,
        number: u64,
        page: u32,
    ) -> Result<Vec<String>, GitHubError> {
        #[derive(serde::Deserialize)]
        struct FileEntry {
            filename: String,
        }

        let url = format!("{}/repos/{}/pulls/{}/files", self.api_url, repo, number);
        let files = self
            .get(&url)
            .query(&[("per_page", PAGE_SIZE), ("page", page)])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<FileEntry>>()
            .await?;
        debug!(files = files.len(), "received changed-files page");

        Ok(files.into_iter().map(|f| f.filename).collect())
    }

    #[instrument(skip(self), fields(repo = %repo, pr = number, page))]
    async fn pr_commits_page(
        &self,
        repo: &str,
        number: u64,
        page: u32,
    ) -> Result<Vec<String>, GitHubError> {
        #[derive(serde::Deserialize)]
        struct CommitDetail {
            message: String,
        }

        #[derive(serde::Deserialize)]
        struct CommitEntry {
            commit: CommitDetail,
        }

        let url = format!("{}/repos/{}/pulls/{}/commits", self.api_url, repo, number);
        let commits = self
            .get(&url)
            .query(&[("per_page", PAGE_SIZE), ("page", page)])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<CommitEntry>>()
            .await?;
        debug!(commits = commits.len(), "received commits page");

        Ok(commits.into_iter().map(|c| c.commit.message).collect())
    }

    #[instrument(skip(self), fields(repo = %repo, since = %since, page))]
    async fn search_merged_page(
        &self,
        repo: &str,
        since: NaiveDate,
        page: u32,
    ) -> Result<SearchSlice, GitHubError> {
        #[derive(serde::Deserialize)]
        struct SearchItem {
            number: u64,
        }

        #[derive(serde::Deserialize)]
        struct SearchResponse {
            total_count: u64,
            items: Vec<SearchItem>,
        }

        let query = format!("repo:{} is:pr is:merged merged:>={}", repo, since);
        let url = format!("{}/search/issues", self.api_url);
        let per_page = PAGE_SIZE.to_string();
        let page_number = page.to_string();
        let response = self
            .get(&url)
            .query(&[
                ("q", query.as_str()),
                ("sort", "created"),
                ("order", "asc"),
                ("per_page", per_page.as_str()),
                ("page", page_number.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<SearchResponse>()
            .await?;
        debug!(total = response.total_count, items = response.items.len(), "received search page");

        Ok(SearchSlice {
            total_count: response.total_count,
            numbers: response.items.into_iter().map(|i| i.number).collect(),
        })
    }
}
