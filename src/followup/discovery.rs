use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::github::{GitHubError, PullRequestHost};

/// Hard cap on search pages. The backing search API refuses to page past the
/// first ~1000 results, so discovery stops here and reports an incomplete
/// window instead of erroring.
pub const MAX_SEARCH_PAGES: u32 = 10;

/// Find PR numbers merged on or after `since`, excluding the source PR.
///
/// Pages are requested in creation order until one of: an empty page, the
/// cumulative count reaching the reported total, or the page cap.
#[instrument(skip(host), fields(repo = %repo, since = %since, source = source_number))]
pub async fn find_candidates(
    host: &dyn PullRequestHost,
    repo: &str,
    since: NaiveDate,
    source_number: u64,
) -> Result<Vec<u64>, GitHubError> {
    let mut numbers: Vec<u64> = Vec::new();
    let mut total_count = 0;

    for page in 1..=MAX_SEARCH_PAGES {
        let slice = host.search_merged_page(repo, since, page).await?;
        total_count = slice.total_count;
        if slice.numbers.is_empty() {
            break;
        }
        numbers.extend(slice.numbers);
        debug!(page, fetched = numbers.len(), total = total_count, "search page consumed");
        if numbers.len() as u64 >= total_count {
            break;
        }
        if page == MAX_SEARCH_PAGES {
            // Documented completeness limitation, not a failure.
            warn!(
                fetched = numbers.len(),
                total = total_count,
                "search window exhausted at {} pages; later candidates are not considered",
                MAX_SEARCH_PAGES
            );
        }
    }

    numbers.retain(|&n| n != source_number);
    Ok(numbers)
}
