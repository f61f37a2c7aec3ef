use serde::Serialize;

use crate::followup::RankedFollowup;

/// Complete report for one analysis run: the ranked follow-ups plus the
/// counts that explain how the list came to be.
#[derive(Debug, Serialize)]
pub struct FollowupReport {
    /// Repository in `owner/repo` form
    pub repo: String,
    /// The source PR the analysis started from
    pub source_number: u64,
    /// Candidates returned by discovery
    pub candidates_found: usize,
    /// Candidates dropped because their data could not be fetched
    pub candidates_excluded: usize,
    /// Ranked follow-ups, best first
    pub followups: Vec<RankedFollowup>,
}
