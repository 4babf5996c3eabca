use super::types::Hunk;
use super::PrError;

/// Parse the `patch` text of one entry from the files endpoint into hunks.
///
/// GitHub sends only the hunk section of a unified diff, without the
/// `diff --git` / `---` / `+++` headers:
///
///   @@ -{old_start},{old_count} +{new_start},{new_count} @@ optional context
///
/// Lines are prefixed with '+' for additions, '-' for deletions and ' ' for
/// context. Anything else (e.g. "\ No newline at end of file") is skipped.
pub fn parse_patch(patch: &str) -> Result<Vec<Hunk>, PrError> {
    let mut hunks = Vec::new();
    let mut current: Option<Hunk> = None;

    for line in patch.lines() {
        if line.starts_with("@@") {
            if let Some(hunk) = current.take() {
                hunks.push(hunk);
            }
            let (old_start, old_count, new_start, new_count) = parse_hunk_header(line)?;
            current = Some(Hunk {
                old_start,
                old_count,
                new_start,
                new_count,
                lines: Vec::new(),
            });
            continue;
        }

        if let Some(hunk) = current.as_mut() {
            if line.starts_with('+') || line.starts_with('-') || line.starts_with(' ') {
                hunk.lines.push(line.to_string());
            }
        } else if !line.trim().is_empty() {
            return Err(PrError::PatchParse(
                "Patch content before first hunk header".to_string(),
            ));
        }
    }

    if let Some(hunk) = current.take() {
        hunks.push(hunk);
    }
    Ok(hunks)
}

/// Added and deleted line counts across all hunks.
pub fn line_counts(hunks: &[Hunk]) -> (usize, usize) {
    hunks
        .iter()
        .flat_map(|h| h.lines.iter())
        .fold((0, 0), |(add, del), line| {
            if line.starts_with('+') {
                (add + 1, del)
            } else if line.starts_with('-') {
                (add, del + 1)
            } else {
                (add, del)
            }
        })
}

/// New-file line number of the first added line.
/// Falls back to the start of the first hunk that keeps new-side lines when
/// a patch only deletes. A hunk with `new_count == 0` has no commentable line.
pub fn first_added_line(hunks: &[Hunk]) -> Option<usize> {
    for hunk in hunks {
        let mut line_no = hunk.new_start;
        for line in &hunk.lines {
            if line.starts_with('+') {
                return Some(line_no);
            }
            if line.starts_with(' ') {
                line_no += 1;
            }
        }
    }
    hunks
        .iter()
        .find(|h| h.new_count > 0 && h.new_start > 0)
        .map(|h| h.new_start)
}

fn parse_hunk_header(line: &str) -> Result<(usize, usize, usize, usize), PrError> {
    let header = line
        .trim()
        .strip_prefix("@@")
        .ok_or_else(|| PrError::PatchParse("Invalid hunk header".to_string()))?;
    let header = match header.split_once("@@") {
        Some((ranges, _section)) => ranges,
        None => header,
    }
    .trim();
    let mut parts = header.split_whitespace();
    let old_part = parts
        .next()
        .ok_or_else(|| PrError::PatchParse("Missing old range".to_string()))?;
    let new_part = parts
        .next()
        .ok_or_else(|| PrError::PatchParse("Missing new range".to_string()))?;

    let (old_start, old_count) = parse_range(old_part, '-')?;
    let (new_start, new_count) = parse_range(new_part, '+')?;

    Ok((old_start, old_count, new_start, new_count))
}

fn parse_range(part: &str, prefix: char) -> Result<(usize, usize), PrError> {
    let range = part
        .strip_prefix(prefix)
        .ok_or_else(|| PrError::PatchParse("Invalid range prefix".to_string()))?;
    let (start_str, count_str) = match range.split_once(',') {
        Some((start, count)) => (start, count),
        None => (range, "1"),
    };
    let start = start_str
        .parse::<usize>()
        .map_err(|_| PrError::PatchParse(format!("Invalid range start in {}", part)))?;
    let count = count_str
        .parse::<usize>()
        .map_err(|_| PrError::PatchParse(format!("Invalid range count in {}", part)))?;
    Ok((start, count))
}
