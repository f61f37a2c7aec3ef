pub mod types;

pub use types::FollowupReport;

use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::followup::{FollowupAnalysis, ScoreBreakdown};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Merge the analysis outcome with the repository identity into a report.
pub fn build(analysis: FollowupAnalysis, repo: &str) -> FollowupReport {
    FollowupReport {
        repo: repo.to_string(),
        source_number: analysis.source_number,
        candidates_found: analysis.candidates_found,
        candidates_excluded: analysis.candidates_excluded,
        followups: analysis.followups,
    }
}

/// Render the report: colored terminal output by default, JSON on stdout
/// with `--json`, and optionally a JSON copy to a file.
#[instrument(skip(report), fields(pr = report.source_number, ranked = report.followups.len()))]
pub fn output(report: &FollowupReport, json: bool, output_path: Option<&Path>) -> Result<(), ReportError> {
    if json {
        debug!("writing JSON report to stdout");
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        debug!("writing report to terminal");
        print_terminal_report(report);
    }

    if let Some(path) = output_path {
        debug!(path = %path.display(), "writing JSON report to file");
        std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    }

    Ok(())
}

/// Human-readable reason lines for one candidate's score breakdown.
fn describe_breakdown(breakdown: &ScoreBreakdown) -> Vec<String> {
    let mut reasons = Vec::new();
    if let Some(files) = &breakdown.shared_files {
        reasons.push(format!("shared files: {}", files.join(", ")));
    }
    if let Some(issues) = &breakdown.shared_issues {
        let issues: Vec<String> = issues.iter().map(|i| format!("#{}", i)).collect();
        reasons.push(format!("shared issue references: {}", issues.join(", ")));
    }
    if let Some(number) = breakdown.back_reference {
        reasons.push(format!("directly references #{}", number));
    }
    if let Some(labels) = &breakdown.shared_area_labels {
        reasons.push(format!("shared area labels: {}", labels.join(", ")));
    }
    if let Some(keyword) = &breakdown.followup_keyword {
        reasons.push(format!("follow-up keyword: \"{}\"", keyword));
    }
    if breakdown.bugfix_in_shared_component == Some(true) {
        reasons.push("bug fix touching a shared component".to_string());
    }
    if let Some(days) = breakdown.days_between {
        let unit = if days == 1 { "day" } else { "days" };
        reasons.push(format!("merged {} {} after the source", days, unit));
    }
    reasons
}

/// Format and print the report to the terminal with colors.
fn print_terminal_report(report: &FollowupReport) {
    println!();
    println!(
        "Follow-up analysis for {}#{}",
        report.repo,
        report.source_number.to_string().cyan().bold()
    );
    let excluded = if report.candidates_excluded > 0 {
        format!(" ({} excluded due to fetch errors)", report.candidates_excluded)
    } else {
        String::new()
    };
    println!(
        "Candidates considered: {}{}",
        report.candidates_found, excluded
    );
    println!();

    if report.followups.is_empty() {
        println!("No follow-up candidates scored above zero.");
        println!();
        return;
    }

    for followup in &report.followups {
        println!(
            "#{}  score {}",
            followup.number.to_string().cyan().bold(),
            format!("{:.2}", followup.score).green().bold()
        );
        for reason in describe_breakdown(&followup.breakdown) {
            println!("  • {}", reason);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::followup::RankedFollowup;

    fn sample_analysis() -> FollowupAnalysis {
        FollowupAnalysis {
            source_number: 100,
            candidates_found: 4,
            candidates_excluded: 1,
            followups: vec![RankedFollowup {
                number: 101,
                score: 29.67,
                breakdown: ScoreBreakdown {
                    shared_files: Some(vec!["a.java".to_string()]),
                    shared_issues: Some(vec![50]),
                    followup_keyword: Some("regression".to_string()),
                    bugfix_in_shared_component: Some(true),
                    days_between: Some(2),
                    ..ScoreBreakdown::default()
                },
            }],
        }
    }

    #[test]
    fn test_build_report_metadata() {
        let report = build(sample_analysis(), "org/repo");
        assert_eq!(report.repo, "org/repo");
        assert_eq!(report.source_number, 100);
        assert_eq!(report.candidates_found, 4);
        assert_eq!(report.candidates_excluded, 1);
        assert_eq!(report.followups.len(), 1);
    }

    #[test]
    fn test_describe_breakdown_lines() {
        let report = build(sample_analysis(), "org/repo");
        let reasons = describe_breakdown(&report.followups[0].breakdown);
        assert_eq!(
            reasons,
            vec![
                "shared files: a.java".to_string(),
                "shared issue references: #50".to_string(),
                "follow-up keyword: \"regression\"".to_string(),
                "bug fix touching a shared component".to_string(),
                "merged 2 days after the source".to_string(),
            ]
        );
    }

    #[test]
    fn test_json_report_omits_absent_signals() {
        let report = build(sample_analysis(), "org/repo");
        let json = serde_json::to_value(&report).unwrap();
        let breakdown = &json["followups"][0]["breakdown"];
        assert_eq!(breakdown["shared_files"][0], "a.java");
        assert_eq!(breakdown["days_between"], 2);
        // Signals that never fired are not serialized at all.
        assert!(breakdown.get("back_reference").is_none());
        assert!(breakdown.get("shared_area_labels").is_none());
    }

    #[test]
    fn test_output_to_file() {
        let report = build(sample_analysis(), "org/repo");
        let path = std::env::temp_dir().join("pr_followups_test_report.json");
        output(&report, false, Some(&path)).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"source_number\": 100"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_terminal_report_does_not_panic() {
        let report = build(sample_analysis(), "org/repo");
        print_terminal_report(&report);

        let empty = build(
            FollowupAnalysis {
                source_number: 7,
                candidates_found: 0,
                candidates_excluded: 0,
                followups: vec![],
            },
            "org/repo",
        );
        print_terminal_report(&empty);
    }

    #[test]
    fn test_output_json_to_stdout() {
        let report = build(sample_analysis(), "org/repo");
        output(&report, true, None).unwrap();
    }
}
