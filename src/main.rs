mod config;
mod followup;
mod github;
mod report;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

/// PR Followups — CLI tool that takes a merged GitHub Pull Request URL and
/// ranks later PRs that should travel with it when backporting to a
/// maintenance branch.
#[derive(Parser, Debug)]
#[command(name = "pr-followups", version, about)]
struct Cli {
    /// GitHub Pull Request URL (e.g., https://github.com/org/repo/pull/42)
    pr_url: String,

    /// Maximum number of ranked follow-ups to report
    #[arg(short = 'n', long, default_value_t = followup::DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Print the report as JSON instead of the colored terminal format
    #[arg(long)]
    json: bool,

    /// Optional output file path for a JSON copy of the report
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let _main_span = info_span!("pr_followups", pr_url = %cli.pr_url).entered();

    info!("parsing PR URL");
    let parsed_url = github::parse_pr_url(&cli.pr_url)?;
    let repo = parsed_url.full_repo();
    debug!(owner = %parsed_url.owner, repo = %parsed_url.repo, pr = parsed_url.pr_number, "parsed PR URL");

    info!("loading configuration");
    let config = config::Config::load()?;
    let client = github::GitHubClient::new(&config)?;

    info!("analyzing follow-up candidates");
    let analysis =
        followup::find_followups(&client, &repo, parsed_url.pr_number, cli.max_results).await?;
    info!(
        found = analysis.candidates_found,
        excluded = analysis.candidates_excluded,
        ranked = analysis.followups.len(),
        "analysis complete"
    );

    let built_report = report::build(analysis, &repo);
    report::output(&built_report, cli.json, cli.output.as_deref())?;

    Ok(())
}
