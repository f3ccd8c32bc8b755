use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Matches file names ending in `.txt` or `.text`, any case
fn text_file_matcher() -> Result<GlobMatcher> {
    let glob = GlobBuilder::new("*.{txt,text}")
        .case_insensitive(true)
        .build()
        .context("Invalid text file pattern")?;
    Ok(glob.compile_matcher())
}

/// Recursively list text files under `root`, following symlinks, sorted.
///
/// Hidden files and ignore files are not special: every text file is indexed.
pub fn list_text_files(root: &Path) -> Result<Vec<PathBuf>> {
    let matcher = text_file_matcher()?;

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(true)
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| matcher.is_match(Path::new(entry.file_name())))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    Ok(files)
}
