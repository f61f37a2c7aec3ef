/// Normalized pull request data as returned by the hosting API collaborator.
/// Raw wire shapes stay inside the client methods; this is what the rest of
/// the crate consumes.
#[derive(Debug, Clone)]
pub struct PullRequestData {
    /// PR number, unique per repository
    pub number: u64,
    /// PR title
    pub title: String,
    /// PR body, absent when the author left it empty
    pub body: Option<String>,
    /// Label names attached to the PR
    pub labels: Vec<String>,
    /// RFC 3339 merge timestamp, absent when the PR is not merged
    pub merged_at: Option<String>,
}

/// One page of merged-PR search results.
#[derive(Debug, Clone)]
pub struct SearchSlice {
    /// Total result count reported by the search API for the whole query
    pub total_count: u64,
    /// PR numbers on this page
    pub numbers: Vec<u64>,
}

/// Represents the parsed components of a GitHub PR URL.
#[derive(Debug, Clone)]
pub struct PrUrl {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

impl PrUrl {
    /// The `owner/repo` form used in API paths and search queries.
    pub fn full_repo(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}
