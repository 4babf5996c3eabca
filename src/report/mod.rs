pub mod types;

pub use types::{Publication, ReviewOutcome};

use crate::pr::PrContext;
use crate::review::GeneratedReview;
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Combine the PR context and generated review into an outcome.
pub fn build(
    context: &PrContext,
    summary: &str,
    generated: GeneratedReview,
    publication: Publication,
) -> ReviewOutcome {
    ReviewOutcome {
        repository: context.full_name.clone(),
        pr_number: context.pull_number,
        pr_title: context.title.clone(),
        summary: summary.to_string(),
        comments: generated.comments,
        skipped: generated.skipped,
        publication,
    }
}

/// Print the run summary to stdout and, if asked, write the review as markdown.
#[instrument(skip(outcome), fields(pr = outcome.pr_number, publication = %outcome.publication))]
pub fn output(outcome: &ReviewOutcome, output_path: Option<&Path>) -> Result<(), ReportError> {
    debug!("writing summary to terminal");
    println!("{}", render_terminal_summary(outcome));

    if let Some(path) = output_path {
        debug!(path = %path.display(), "writing review to file");
        write_markdown_review(outcome, path)?;
    }
    Ok(())
}

/// Format the summary for the terminal:
///
/// PR #7 in o/r: "Tune retry budget"
/// Reviewed: 2 | Skipped: 1
///
///   • src/lib.rs:1
///   • src/main.rs:1
///
/// ═══ Review: POSTED ═══
fn render_terminal_summary(outcome: &ReviewOutcome) -> String {
    let mut out = String::from("\n");
    out.push_str(&format!(
        "PR #{} in {}: \"{}\"\n",
        outcome.pr_number, outcome.repository, outcome.pr_title
    ));
    out.push_str(&format!(
        "Reviewed: {} | Skipped: {}\n\n",
        outcome.comments.len(),
        outcome.skipped.len()
    ));

    if outcome.comments.is_empty() {
        out.push_str("  No comments.\n");
    } else {
        for comment in &outcome.comments {
            out.push_str(&format!("  • {}:{}\n", comment.path, comment.line));
        }
    }
    for skipped in &outcome.skipped {
        out.push_str(&format!("  {} {}\n", "skipped".dimmed(), skipped));
    }
    out.push('\n');

    out.push_str(&format!(
        "═══ Review: {} ═══\n",
        colorize_publication(outcome.publication)
    ));
    out
}

/// Render the review as markdown: the summary body, then one section per
/// commented file.
fn render_markdown(outcome: &ReviewOutcome) -> String {
    let mut md = String::new();
    md.push_str(&format!(
        "# PR #{}: \"{}\"\n\n",
        outcome.pr_number, outcome.pr_title
    ));
    md.push_str(&format!(
        "**Repository:** {} | **Status:** {}\n\n",
        outcome.repository, outcome.publication
    ));
    md.push_str(&format!("{}\n\n", outcome.summary));

    for comment in &outcome.comments {
        md.push_str(&format!("## `{}` (line {})\n\n", comment.path, comment.line));
        md.push_str(comment.body.trim_end());
        md.push_str("\n\n");
    }

    if !outcome.skipped.is_empty() {
        md.push_str("## Skipped\n\n");
        for skipped in &outcome.skipped {
            md.push_str(&format!("- `{}`\n", skipped));
        }
    }
    md
}

fn write_markdown_review(outcome: &ReviewOutcome, path: &Path) -> Result<(), ReportError> {
    std::fs::write(path, render_markdown(outcome))?;
    Ok(())
}

fn colorize_publication(publication: Publication) -> colored::ColoredString {
    let label = publication.to_string();
    match publication {
        Publication::Posted => label.green().bold(),
        Publication::NothingToPost => label.yellow().bold(),
        Publication::DryRun => label.cyan().bold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr::ReviewComment;

    fn sample_context() -> PrContext {
        PrContext {
            owner: "o".to_string(),
            repo: "r".to_string(),
            full_name: "o/r".to_string(),
            pull_number: 7,
            title: "Tune retry budget".to_string(),
            description: String::new(),
        }
    }

    fn sample_review() -> GeneratedReview {
        GeneratedReview {
            comments: vec![ReviewComment {
                path: "a.py".to_string(),
                body: "Consider a named constant.\n".to_string(),
                line: 1,
            }],
            skipped: vec!["old.py".to_string()],
        }
    }

    #[test]
    fn test_build_outcome() {
        let outcome = build(&sample_context(), "summary", sample_review(), Publication::Posted);
        assert_eq!(outcome.repository, "o/r");
        assert_eq!(outcome.pr_number, 7);
        assert_eq!(outcome.comments.len(), 1);
        assert_eq!(outcome.skipped, vec!["old.py".to_string()]);
        assert_eq!(outcome.publication, Publication::Posted);
    }

    #[test]
    fn test_render_markdown() {
        let outcome = build(
            &sample_context(),
            "Automated code review by OpenAI",
            sample_review(),
            Publication::DryRun,
        );
        let md = render_markdown(&outcome);
        assert!(md.contains("# PR #7: \"Tune retry budget\""));
        assert!(md.contains("**Status:** DRY RUN"));
        assert!(md.contains("Automated code review by OpenAI"));
        assert!(md.contains("## `a.py` (line 1)\n\nConsider a named constant.\n"));
        assert!(md.contains("## Skipped\n\n- `old.py`"));
    }

    #[test]
    fn test_output_to_file() {
        let outcome = build(
            &sample_context(),
            "summary",
            GeneratedReview::default(),
            Publication::NothingToPost,
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.md");
        output(&outcome, Some(path.as_path())).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("**Status:** NOTHING TO POST"));
        assert!(!content.contains("## Skipped"));
    }

    #[test]
    fn test_output_to_missing_directory_fails() {
        let outcome = build(&sample_context(), "summary", sample_review(), Publication::Posted);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("review.md");
        assert!(matches!(
            output(&outcome, Some(path.as_path())),
            Err(ReportError::FileWrite(_))
        ));
    }

    #[test]
    fn test_terminal_summary_lists_comments_and_skips() {
        colored::control::set_override(false);
        let outcome = build(&sample_context(), "summary", sample_review(), Publication::Posted);
        let text = render_terminal_summary(&outcome);
        assert!(text.contains("PR #7 in o/r: \"Tune retry budget\""));
        assert!(text.contains("Reviewed: 1 | Skipped: 1"));
        assert!(text.contains("  • a.py:1\n"));
        assert!(text.contains("skipped old.py"));
        assert!(text.contains("═══ Review: POSTED ═══"));
        assert!(!text.contains("No comments."));
    }

    #[test]
    fn test_terminal_summary_without_comments() {
        colored::control::set_override(false);
        let outcome = build(
            &sample_context(),
            "summary",
            GeneratedReview::default(),
            Publication::NothingToPost,
        );
        let text = render_terminal_summary(&outcome);
        assert!(text.contains("Reviewed: 0 | Skipped: 0"));
        assert!(text.contains("  No comments.\n"));
        assert!(text.contains("═══ Review: NOTHING TO POST ═══"));
    }
}
