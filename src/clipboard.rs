//! Input loader for the clipboard export.
//!
//! The export interleaves a `www.bing.com` marker line with each
//! result-page URL. Markers and blank lines are filtered out; what
//! remains, in file order, is the URL list for the run.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

/// Marker line the clipboard export inserts between URLs.
pub const MARKER: &str = "www.bing.com";

/// Load the ordered result-page URL list from the clipboard export.
///
/// A missing or unreadable input file is fatal for the run.
pub fn load_url_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    Ok(parse_lines(&content))
}

/// Filter marker and blank lines; the remaining lines are URLs.
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != MARKER)
        .inspect(|line| {
            if url::Url::parse(line).is_err() {
                warn!(line, "input line does not parse as a URL");
            }
        })
        .map(str::to_string)
        .collect()
}
