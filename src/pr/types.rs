use serde::{Deserialize, Serialize};

/// The pull-request event payload written by the CI runner.
/// Only the fields the reviewer needs are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDescriptor {
    pub repository: Repository,
    /// PR number
    pub number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// "owner/name"
    pub full_name: String,
    pub name: String,
    pub owner: Owner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Everything the review stages know about the PR.
/// Built from the event descriptor plus the "get pull request" response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrContext {
    pub owner: String,
    pub repo: String,
    pub full_name: String,
    pub pull_number: u64,
    pub title: String,
    pub description: String,
}

/// Change status of a file, as reported by the files endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    Renamed,
    Copied,
    Changed,
    Unchanged,
    #[serde(other)]
    Other,
}

/// One entry of the PR's changed-file list.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDiff {
    pub filename: String,
    pub status: FileStatus,
    /// Absent for binary files and very large diffs.
    #[serde(default)]
    pub patch: Option<String>,
}

impl FileDiff {
    pub fn is_removed(&self) -> bool {
        self.status == FileStatus::Removed
    }

    pub fn patch_text(&self) -> &str {
        self.patch.as_deref().unwrap_or("")
    }
}

/// A single inline comment of the posted review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewComment {
    pub path: String,
    pub body: String,
    pub line: usize,
}

/// Body of the "create review" request.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRequest<'a> {
    pub event: &'static str,
    pub body: &'a str,
    pub comments: &'a [ReviewComment],
}

/// A contiguous region of changes within a file patch.
#[derive(Debug, Clone)]
#[allow(dead_code)] // Old-side ranges are parsed but only the new side anchors comments
pub struct Hunk {
    /// Starting line number in the old file
    pub old_start: usize,
    /// Number of lines in the old file
    pub old_count: usize,
    /// Starting line number in the new file
    pub new_start: usize,
    /// Number of lines in the new file
    pub new_count: usize,
    /// Raw lines of the hunk (prefixed with +, -, or space)
    pub lines: Vec<String>,
}
