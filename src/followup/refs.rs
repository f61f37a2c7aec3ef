use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Issue/PR reference patterns recognized in titles, bodies and commit
/// messages: bare `#123`, `GH-123`, and `fixes #123`-style action verbs.
/// All three are matched and unioned; the set collapses duplicates.
static REF_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"#(\d+)").unwrap(),
        Regex::new(r"(?i)GH-(\d+)").unwrap(),
        Regex::new(r"(?i)(?:fix|fixes|fixed|close|closes|closed|resolve|resolves|resolved)\s+#(\d+)")
            .unwrap(),
    ]
});

/// Extract every issue/PR number referenced in `text`.
///
/// Pure and deterministic; empty input yields an empty set. Callers with
/// optional text pass `body.as_deref().unwrap_or("")`.
pub fn extract_issue_refs(text: &str) -> HashSet<u64> {
    let mut refs = HashSet::new();
    if text.is_empty() {
        return refs;
    }
    for pattern in REF_PATTERNS.iter() {
        for capture in pattern.captures_iter(text) {
            if let Ok(number) = capture[1].parse::<u64>() {
                refs.insert(number);
            }
        }
    }
    refs
}
