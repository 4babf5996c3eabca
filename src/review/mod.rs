pub mod completion;
pub mod prompt;

pub use completion::CompletionClient;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};

use crate::config::{LineAnchor, ReviewConfig};
use crate::pr::diff;
use crate::pr::{FileDiff, PrContext, ReviewComment};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Completion API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Requesting completion failed with status {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("Unexpected completion response: {0}")]
    ResponseShape(String),

    #[error("Invalid completion API key header: {0}")]
    InvalidHeader(String),
}

/// Something that turns a review prompt into review text.
#[async_trait]
pub trait Reviewer: Send + Sync {
    async fn review(&self, prompt: &str) -> Result<String, ReviewError>;
}

/// Comments produced for a PR, plus the files that yielded nothing.
#[derive(Debug, Clone, Default)]
pub struct GeneratedReview {
    pub comments: Vec<ReviewComment>,
    /// Files not reviewed: removed, or the model answered blank.
    pub skipped: Vec<String>,
}

/// Review every non-removed file, one completion call at a time.
///
/// The first failing call aborts the whole review.
pub async fn generate_comments(
    files: &[FileDiff],
    context: &PrContext,
    reviewer: &dyn Reviewer,
    settings: &ReviewConfig,
) -> Result<GeneratedReview, ReviewError> {
    let mut generated = GeneratedReview::default();

    for file in files {
        if file.is_removed() {
            debug!(file = %file.filename, "skipping removed file");
            generated.skipped.push(file.filename.clone());
            continue;
        }

        let prompt = prompt::build_prompt(file, context);
        let text = reviewer
            .review(&prompt)
            .instrument(info_span!("review_file", file = %file.filename))
            .await?;

        if text.trim().is_empty() {
            debug!(file = %file.filename, "blank review, no comment");
            generated.skipped.push(file.filename.clone());
            continue;
        }

        let line = anchor_line(file, settings.anchor);
        debug!(file = %file.filename, line, "review comment ready");
        generated.comments.push(ReviewComment {
            path: file.filename.clone(),
            body: text,
            line,
        });
    }

    info!(
        comments = generated.comments.len(),
        skipped = generated.skipped.len(),
        "review generation complete"
    );
    Ok(generated)
}

/// Line a file's comment is attached to.
pub fn anchor_line(file: &FileDiff, anchor: LineAnchor) -> usize {
    match anchor {
        LineAnchor::Placeholder => 1,
        LineAnchor::FirstChange => match diff::parse_patch(file.patch_text()) {
            Ok(hunks) => {
                let (additions, deletions) = diff::line_counts(&hunks);
                debug!(file = %file.filename, additions, deletions, "parsed patch");
                diff::first_added_line(&hunks).unwrap_or(1)
            }
            Err(e) => {
                debug!(file = %file.filename, error = %e, "unparseable patch, using line 1");
                1
            }
        },
    }
}
