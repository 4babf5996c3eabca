mod config;
mod pr;
mod report;
mod review;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use config::Config;
use report::{Publication, ReviewOutcome};

/// PR Reviewer — reviews every changed file of a GitHub Pull Request with a
/// chat-completion API and posts the feedback as a single PR review.
///
/// Credentials and endpoints come from PAT_TOKEN, OPENAI_API_KEY,
/// OPENAI_API_KEY_HEADER and OPENAI_ENDPOINT; the event from GITHUB_EVENT_PATH.
#[derive(Parser, Debug)]
#[command(name = "pr-reviewer", version, about)]
struct Cli {
    /// Event descriptor JSON (overrides GITHUB_EVENT_PATH)
    #[arg(long)]
    event: Option<PathBuf>,

    /// TOML config file (default: .pr-reviewer.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate comments but do not post the review
    #[arg(long)]
    dry_run: bool,

    /// Optional output file path for a markdown copy of the review
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

    info!("loading configuration");
    let config = Config::load(cli.config.as_deref(), cli.event.as_deref())?;
    debug!(?config, "resolved configuration");

    let outcome = run(&config, cli.dry_run)
        .instrument(info_span!("pr_review", event = %config.event_path.display()))
        .await?;

    report::output(&outcome, cli.output.as_deref())?;
    info!(publication = %outcome.publication, "done");

    Ok(())
}

/// One pass: context, files, per-file review, publish.
async fn run(config: &Config, dry_run: bool) -> Result<ReviewOutcome, Box<dyn std::error::Error>> {
    let github = pr::GitHubClient::new(&config.github)?;
    let reviewer = review::CompletionClient::new(&config.completion)?;

    info!("reading event descriptor");
    let event = pr::read_event(&config.event_path)?;

    info!("fetching pull request from GitHub");
    let context = github.fetch_context(&event).await?;
    info!(repo = %context.full_name, pr = context.pull_number, "fetched PR metadata");

    info!("fetching changed files");
    let files = github
        .fetch_files(&context.owner, &context.repo, context.pull_number)
        .await?;
    info!(files = files.len(), "fetched PR files");

    info!("generating review comments");
    let generated =
        review::generate_comments(&files, &context, &reviewer, &config.review).await?;

    let publication = if dry_run {
        info!(comments = generated.comments.len(), "dry run, review not posted");
        Publication::DryRun
    } else if pr::publish(
        &github,
        &context,
        &config.review.summary_body,
        &generated.comments,
    )
    .await?
    {
        info!(comments = generated.comments.len(), "posted review");
        Publication::Posted
    } else {
        Publication::NothingToPost
    };

    Ok(report::build(
        &context,
        &config.review.summary_body,
        generated,
        publication,
    ))
}
