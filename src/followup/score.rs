use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::context::PrFactSheet;

const SHARED_FILE_WEIGHT: f64 = 10.0;
const SHARED_ISSUE_WEIGHT: f64 = 8.0;
const BACK_REFERENCE_WEIGHT: f64 = 15.0;
const AREA_LABEL_WEIGHT: f64 = 3.0;
const KEYWORD_WEIGHT: f64 = 2.0;
const BUGFIX_WEIGHT: f64 = 5.0;
const PROXIMITY_WEIGHT: f64 = 5.0;
const PROXIMITY_WINDOW_DAYS: f64 = 30.0;

/// At most this many overlapping filenames are kept as evidence.
const MAX_RECORDED_FILES: usize = 5;

const AREA_LABEL_PREFIX: &str = "area/";
const BUG_LABELS: [&str; 2] = ["kind/bugfix", "kind/bug"];

/// Phrases whose presence in a candidate's title or body marks it as a likely
/// follow-up change. Checked in order; the first match is the one recorded.
const FOLLOWUP_KEYWORDS: [&str; 13] = [
    "follow up",
    "followup",
    "additional fix",
    "further fix",
    "another fix",
    "regression",
    "broken by",
    "broke",
    "revert",
    "reverts",
    "improve",
    "enhancement",
    "refinement",
];

static KEYWORD_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    FOLLOWUP_KEYWORDS
        .iter()
        .map(|kw| (*kw, Regex::new(&format!("(?i){}", regex::escape(kw))).unwrap()))
        .collect()
});

/// Evidence for each signal that fired, one optional field per signal kind.
/// Exists purely for auditability; only the numeric score drives ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Overlapping filenames (at most five recorded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_files: Option<Vec<String>>,
    /// Overlapping issue references
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_issues: Option<Vec<u64>>,
    /// The source PR number, when the candidate references it directly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_reference: Option<u64>,
    /// Shared `area/` labels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_area_labels: Option<Vec<String>>,
    /// The first follow-up keyword matched in the candidate's text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_keyword: Option<String>,
    /// Candidate carries a bug label and touches a shared file or area
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bugfix_in_shared_component: Option<bool>,
    /// Days between the source and candidate merges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_between: Option<i64>,
}

enum Evidence {
    SharedFiles(Vec<String>),
    SharedIssues(Vec<u64>),
    BackReference(u64),
    SharedAreaLabels(Vec<String>),
    FollowupKeyword(String),
    BugfixInSharedComponent,
    DaysBetween(i64),
}

struct SignalHit {
    weight: f64,
    evidence: Evidence,
}

impl ScoreBreakdown {
    fn record(&mut self, evidence: Evidence) {
        match evidence {
            Evidence::SharedFiles(files) => self.shared_files = Some(files),
            Evidence::SharedIssues(issues) => self.shared_issues = Some(issues),
            Evidence::BackReference(number) => self.back_reference = Some(number),
            Evidence::SharedAreaLabels(labels) => self.shared_area_labels = Some(labels),
            Evidence::FollowupKeyword(keyword) => self.followup_keyword = Some(keyword),
            Evidence::BugfixInSharedComponent => self.bugfix_in_shared_component = Some(true),
            Evidence::DaysBetween(days) => self.days_between = Some(days),
        }
    }
}

type Signal = fn(&PrFactSheet, &PrFactSheet) -> Option<SignalHit>;

/// The signals, each an independent pure evaluator. Every signal that fires
/// contributes additively; none short-circuits another.
const SIGNALS: &[Signal] = &[
    shared_files,
    shared_issues,
    back_reference,
    shared_area_labels,
    followup_keyword,
    bugfix_in_shared_component,
    time_proximity,
];

/// Score a candidate against the source PR.
///
/// Chronology is a hard gate: an unmerged candidate, or one merged at or
/// before the source, scores `(0.0, {})` regardless of any other overlap.
/// Past the gate the score is the sum of all triggered signal weights,
/// unbounded above. Filtering non-positive scores is the ranker's job, not
/// this function's.
pub fn score(source: &PrFactSheet, candidate: &PrFactSheet) -> (f64, ScoreBreakdown) {
    let (Some(source_merged), Some(candidate_merged)) = (source.merged_at, candidate.merged_at)
    else {
        return (0.0, ScoreBreakdown::default());
    };
    if candidate_merged <= source_merged {
        return (0.0, ScoreBreakdown::default());
    }

    let mut total = 0.0;
    let mut breakdown = ScoreBreakdown::default();
    for signal in SIGNALS {
        if let Some(hit) = signal(source, candidate) {
            total += hit.weight;
            breakdown.record(hit.evidence);
        }
    }
    (total, breakdown)
}

/// Sorted intersection of two string sets, for deterministic evidence.
fn sorted_intersection(
    a: &std::collections::HashSet<String>,
    b: &std::collections::HashSet<String>,
) -> Vec<String> {
    let mut shared: Vec<String> = a.intersection(b).cloned().collect();
    shared.sort();
    shared
}

fn shared_files(source: &PrFactSheet, candidate: &PrFactSheet) -> Option<SignalHit> {
    let shared = sorted_intersection(&source.files, &candidate.files);
    if shared.is_empty() {
        return None;
    }
    let weight = SHARED_FILE_WEIGHT * shared.len() as f64;
    let mut recorded = shared;
    recorded.truncate(MAX_RECORDED_FILES);
    Some(SignalHit {
        weight,
        evidence: Evidence::SharedFiles(recorded),
    })
}

fn shared_issues(source: &PrFactSheet, candidate: &PrFactSheet) -> Option<SignalHit> {
    let mut shared: Vec<u64> = source
        .issue_refs
        .intersection(&candidate.issue_refs)
        .copied()
        .collect();
    if shared.is_empty() {
        return None;
    }
    shared.sort_unstable();
    Some(SignalHit {
        weight: SHARED_ISSUE_WEIGHT * shared.len() as f64,
        evidence: Evidence::SharedIssues(shared),
    })
}

fn back_reference(source: &PrFactSheet, candidate: &PrFactSheet) -> Option<SignalHit> {
    if !candidate.issue_refs.contains(&source.number) {
        return None;
    }
    Some(SignalHit {
        weight: BACK_REFERENCE_WEIGHT,
        evidence: Evidence::BackReference(source.number),
    })
}

fn shared_area_labels(source: &PrFactSheet, candidate: &PrFactSheet) -> Option<SignalHit> {
    let mut shared: Vec<String> = source
        .labels
        .intersection(&candidate.labels)
        .filter(|label| label.starts_with(AREA_LABEL_PREFIX))
        .cloned()
        .collect();
    if shared.is_empty() {
        return None;
    }
    shared.sort();
    Some(SignalHit {
        weight: AREA_LABEL_WEIGHT * shared.len() as f64,
        evidence: Evidence::SharedAreaLabels(shared),
    })
}

fn followup_keyword(_source: &PrFactSheet, candidate: &PrFactSheet) -> Option<SignalHit> {
    let text = format!("{} {}", candidate.title, candidate.body);
    let (keyword, _) = KEYWORD_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&text))?;
    Some(SignalHit {
        weight: KEYWORD_WEIGHT,
        evidence: Evidence::FollowupKeyword((*keyword).to_string()),
    })
}

fn bugfix_in_shared_component(source: &PrFactSheet, candidate: &PrFactSheet) -> Option<SignalHit> {
    let has_bug_label = BUG_LABELS.iter().any(|l| candidate.labels.contains(*l));
    if !has_bug_label {
        return None;
    }
    let touches_shared = shared_files(source, candidate).is_some()
        || shared_area_labels(source, candidate).is_some();
    if !touches_shared {
        return None;
    }
    Some(SignalHit {
        weight: BUGFIX_WEIGHT,
        evidence: Evidence::BugfixInSharedComponent,
    })
}

fn time_proximity(source: &PrFactSheet, candidate: &PrFactSheet) -> Option<SignalHit> {
    // The chronology gate guarantees both timestamps exist here.
    let source_merged = source.merged_at?;
    let candidate_merged = candidate.merged_at?;
    let days = (candidate_merged - source_merged).num_days();
    let weight =
        (PROXIMITY_WEIGHT - (days as f64 / PROXIMITY_WINDOW_DAYS) * PROXIMITY_WEIGHT).max(0.0);
    // The day count is recorded even outside the window, where the weight is 0.
    Some(SignalHit {
        weight,
        evidence: Evidence::DaysBetween(days),
    })
}
