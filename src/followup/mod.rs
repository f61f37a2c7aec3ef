pub mod context;
pub mod discovery;
pub mod refs;
pub mod score;

pub use context::PrFactSheet;
pub use refs::extract_issue_refs;
pub use score::ScoreBreakdown;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::github::{GitHubError, PullRequestHost};

/// Default cap on the ranked result list.
pub const DEFAULT_MAX_RESULTS: usize = 50;

#[derive(Debug, Error)]
pub enum FollowupError {
    #[error("Source pull request {repo}#{number} is not merged; nothing to analyze")]
    SourceNotMerged { repo: String, number: u64 },

    #[error(transparent)]
    Api(#[from] GitHubError),
}

/// One ranked follow-up candidate: its number, relevance score, and the
/// evidence behind the score.
#[derive(Debug, Clone, Serialize)]
pub struct RankedFollowup {
    pub number: u64,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Outcome of a full analysis run. The counts are part of the contract: a
/// run never finishes with a silently empty list, it says what it looked at.
#[derive(Debug, Serialize)]
pub struct FollowupAnalysis {
    pub source_number: u64,
    pub candidates_found: usize,
    pub candidates_excluded: usize,
    pub followups: Vec<RankedFollowup>,
}

/// Find follow-up PRs for `source_number`: PRs merged afterwards that share
/// files, issues, labels or textual links with it.
///
/// A missing or unmerged source PR is fatal. A candidate whose fact sheet
/// cannot be built (deleted, inaccessible, transient error) is logged,
/// counted as excluded, and skipped; the run continues. Candidates are
/// evaluated sequentially in discovery order, which is also the tie-break
/// order of the final stable descending sort.
#[instrument(skip(host), fields(repo = %repo, source = source_number))]
pub async fn find_followups(
    host: &dyn PullRequestHost,
    repo: &str,
    source_number: u64,
    max_results: usize,
) -> Result<FollowupAnalysis, FollowupError> {
    let source = context::build_context(host, repo, source_number).await?;
    let since = source
        .merged_at
        .ok_or_else(|| FollowupError::SourceNotMerged {
            repo: repo.to_string(),
            number: source_number,
        })?
        .date_naive();

    let candidates = discovery::find_candidates(host, repo, since, source_number).await?;
    info!(candidates = candidates.len(), since = %since, "discovered candidates");

    let mut excluded = 0;
    let mut ranked = Vec::new();
    for &number in &candidates {
        let candidate = match context::build_context(host, repo, number).await {
            Ok(sheet) => sheet,
            Err(err) => {
                warn!(candidate = number, error = %err, "skipping candidate");
                excluded += 1;
                continue;
            }
        };
        let (total, breakdown) = score::score(&source, &candidate);
        debug!(candidate = number, score = total, "scored candidate");
        if total > 0.0 {
            ranked.push(RankedFollowup {
                number,
                score: total,
                breakdown,
            });
        }
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(max_results);

    Ok(FollowupAnalysis {
        source_number,
        candidates_found: candidates.len(),
        candidates_excluded: excluded,
        followups: ranked,
    })
}
