use crate::pr::ReviewComment;

/// What happened to the generated review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    /// Posted as a PR review.
    Posted,
    /// No comments, so nothing was sent.
    NothingToPost,
    /// Posting disabled with --dry-run.
    DryRun,
}

impl std::fmt::Display for Publication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Publication::Posted => write!(f, "POSTED"),
            Publication::NothingToPost => write!(f, "NOTHING TO POST"),
            Publication::DryRun => write!(f, "DRY RUN"),
        }
    }
}

/// Outcome of one reviewer run.
#[derive(Debug)]
pub struct ReviewOutcome {
    /// "owner/repo"
    pub repository: String,
    /// PR number
    pub pr_number: u64,
    /// PR title
    pub pr_title: String,
    /// Summary body of the review
    pub summary: String,
    /// Generated inline comments
    pub comments: Vec<ReviewComment>,
    /// Files that produced no comment
    pub skipped: Vec<String>,
    pub publication: Publication,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publication_display() {
        assert_eq!(Publication::Posted.to_string(), "POSTED");
        assert_eq!(Publication::NothingToPost.to_string(), "NOTHING TO POST");
        assert_eq!(Publication::DryRun.to_string(), "DRY RUN");
    }
}
