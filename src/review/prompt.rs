use crate::pr::{FileDiff, PrContext};

/// Build the review prompt for one changed file.
///
/// Title, description and patch are embedded verbatim.
pub fn build_prompt(file: &FileDiff, context: &PrContext) -> String {
    format!(
        "Your task is to review pull requests. Point out bugs, risky changes and \
unclear code in the diff below, and suggest concrete improvements. \
Use GitHub Markdown in your answer.\n\
\n\
Pull request title: {title}\n\
Pull request description:\n\
{description}\n\
\n\
File: {path}\n\
Diff to review:\n\
{patch}\n",
        title = context.title,
        description = context.description,
        path = file.filename,
        patch = file.patch_text(),
    )
}
