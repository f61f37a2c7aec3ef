use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, instrument};

use super::refs::extract_issue_refs;
use crate::github::{GitHubError, PullRequestHost};

/// Normalized fact sheet for one PR: everything the scorer compares, derived
/// once per analysis run and immutable afterwards.
#[derive(Debug, Clone)]
pub struct PrFactSheet {
    /// PR number, unique per repository
    pub number: u64,
    /// Repository-relative paths touched by the PR
    pub files: HashSet<String>,
    /// Issue/PR numbers referenced from title, body and every commit message
    pub issue_refs: HashSet<u64>,
    /// Label names attached to the PR
    pub labels: HashSet<String>,
    /// Merge timestamp; None means the PR is not merged
    pub merged_at: Option<DateTime<Utc>>,
    /// Raw title, kept for pattern matching only
    pub title: String,
    /// Raw body, kept for pattern matching only
    pub body: String,
}

/// Build the fact sheet for one PR, paginating files and commits until the
/// host returns an empty page. Transport errors propagate to the caller: the
/// ranker treats a failure on the source PR as fatal and a failure on a
/// candidate as a skip.
#[instrument(skip(host), fields(repo = %repo, pr = number))]
pub async fn build_context(
    host: &dyn PullRequestHost,
    repo: &str,
    number: u64,
) -> Result<PrFactSheet, GitHubError> {
    let pr = host.pull_request(repo, number).await?;

    let mut files = HashSet::new();
    let mut page = 1;
    loop {
        let batch = host.pr_files_page(repo, number, page).await?;
        if batch.is_empty() {
            break;
        }
        files.extend(batch);
        page += 1;
    }

    let mut commit_messages = Vec::new();
    let mut page = 1;
    loop {
        let batch = host.pr_commits_page(repo, number, page).await?;
        if batch.is_empty() {
            break;
        }
        commit_messages.extend(batch);
        page += 1;
    }

    let body = pr.body.unwrap_or_default();
    let mut issue_refs = extract_issue_refs(&pr.title);
    issue_refs.extend(extract_issue_refs(&body));
    for message in &commit_messages {
        issue_refs.extend(extract_issue_refs(message));
    }

    // GitHub emits RFC 3339 timestamps; anything else is a malformed response.
    let merged_at = match pr.merged_at {
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(&raw)
                .map_err(|_| GitHubError::InvalidTimestamp(raw))?
                .with_timezone(&Utc),
        ),
        None => None,
    };

    debug!(
        files = files.len(),
        issue_refs = issue_refs.len(),
        commits = commit_messages.len(),
        merged = merged_at.is_some(),
        "built PR fact sheet"
    );

    Ok(PrFactSheet {
        number: pr.number,
        files,
        issue_refs,
        labels: pr.labels.into_iter().collect(),
        merged_at,
        title: pr.title,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::followup::tests::MockHost;
    use crate::github::PullRequestData;

    fn host_with_pr(pr: PullRequestData) -> MockHost {
        let mut host = MockHost::default();
        host.add_pr(pr);
        host
    }

    #[tokio::test]
    async fn test_builds_fact_sheet_from_all_sources() {
        let mut host = host_with_pr(PullRequestData {
            number: 7,
            title: "Fix widget layout GH-100".to_string(),
            body: Some("Closes #200".to_string()),
            labels: vec!["area/ui".to_string()],
            merged_at: Some("2024-03-01T12:00:00Z".to_string()),
        });
        host.files.insert(7, vec!["a.rs".to_string(), "b.rs".to_string()]);
        host.commits
            .insert(7, vec!["tidy up".to_string(), "follow-up to #300".to_string()]);

        let sheet = build_context(&host, "org/repo", 7).await.unwrap();
        assert_eq!(sheet.number, 7);
        assert_eq!(sheet.files, HashSet::from(["a.rs".to_string(), "b.rs".to_string()]));
        assert_eq!(sheet.issue_refs, HashSet::from([100, 200, 300]));
        assert!(sheet.labels.contains("area/ui"));
        assert!(sheet.merged_at.is_some());
    }

    #[tokio::test]
    async fn test_paginates_until_empty_page() {
        // MockHost serves pages of two entries, so five files span three pages.
        let mut host = host_with_pr(PullRequestData {
            number: 7,
            title: "t".to_string(),
            body: None,
            labels: vec![],
            merged_at: None,
        });
        host.files.insert(
            7,
            (1..=5).map(|i| format!("file{}.rs", i)).collect(),
        );

        let sheet = build_context(&host, "org/repo", 7).await.unwrap();
        assert_eq!(sheet.files.len(), 5);
    }

    #[tokio::test]
    async fn test_unmerged_pr_has_no_timestamp() {
        let host = host_with_pr(PullRequestData {
            number: 7,
            title: "t".to_string(),
            body: None,
            labels: vec![],
            merged_at: None,
        });

        let sheet = build_context(&host, "org/repo", 7).await.unwrap();
        assert!(sheet.merged_at.is_none());
        assert!(sheet.body.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_timestamp_is_an_error() {
        let host = host_with_pr(PullRequestData {
            number: 7,
            title: "t".to_string(),
            body: None,
            labels: vec![],
            merged_at: Some("yesterday-ish".to_string()),
        });

        assert!(matches!(
            build_context(&host, "org/repo", 7).await,
            Err(GitHubError::InvalidTimestamp(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_pr_propagates() {
        let host = MockHost::default();
        assert!(matches!(
            build_context(&host, "org/repo", 99).await,
            Err(GitHubError::NotFound { .. })
        ));
    }
}
