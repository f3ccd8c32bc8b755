use crate::index::{ConcurrentIndex, InvertedIndex};
use crate::runner::TaskRunner;
use crate::utils::progress::item_bar;
use crate::utils::{list_text_files, stem_file};
use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome of one index build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildSummary {
    /// Candidate files found
    pub files: usize,
    /// Files read and merged into the index
    pub indexed: usize,
    /// Files that could not be read
    pub failed: usize,
}

/// The file itself, or every text file below a directory
pub fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        Ok(vec![path.to_path_buf()])
    } else if path.is_dir() {
        list_text_files(path)
            .with_context(|| format!("Failed to list text files in {}", path.display()))
    } else {
        tracing::warn!(path = %path.display(), "input is neither a file nor a directory");
        Ok(Vec::new())
    }
}

/// Location key a file is indexed under
pub fn location_of(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Stem a file and add its words to `index` at sequential positions
pub fn add_file(path: &Path, index: &mut InvertedIndex) -> io::Result<()> {
    let words = stem_file(path)?;
    index.add_all(&location_of(path), words);
    Ok(())
}

/// Build on the calling thread
pub fn build_index(path: &Path, index: &mut InvertedIndex, silent: bool) -> Result<BuildSummary> {
    let files = collect_files(path)?;
    let progress = item_bar(files.len() as u64, "Indexing files...", silent);

    let mut summary = BuildSummary {
        files: files.len(),
        ..Default::default()
    };

    for file in &files {
        match add_file(file, index) {
            Ok(()) => summary.indexed += 1,
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "unable to index file");
                summary.failed += 1;
            }
        }
        progress.inc(1);
    }

    progress.finish_with_message(format!("Indexed {} files", summary.indexed));
    Ok(summary)
}

/// Builds into a shared index with one task per file
pub struct ThreadedBuilder {
    index: Arc<ConcurrentIndex>,
    runner: TaskRunner,
    silent: bool,
}

impl ThreadedBuilder {
    pub fn new(index: Arc<ConcurrentIndex>, runner: TaskRunner) -> Self {
        Self {
            index,
            runner,
            silent: false,
        }
    }

    /// Suppress the progress bar
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Index `path` and wait for every file task to finish.
    ///
    /// Each task reads into a private index and publishes it with one merge.
    /// A file that cannot be read is logged and counted without affecting
    /// its siblings.
    pub fn build(&self, path: &Path) -> Result<BuildSummary> {
        let files = collect_files(path)?;
        let progress = item_bar(files.len() as u64, "Indexing files...", self.silent);
        let indexed = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        tracing::info!(files = files.len(), workers = self.runner.workers(), "building index");

        for file in &files {
            let file = file.clone();
            let index = Arc::clone(&self.index);
            let progress = progress.clone();
            let indexed = Arc::clone(&indexed);
            let failed = Arc::clone(&failed);

            self.runner.submit(move |_| {
                let mut local = InvertedIndex::new();
                match add_file(&file, &mut local) {
                    Ok(()) => {
                        index.merge(local);
                        indexed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        tracing::warn!(path = %file.display(), error = %e, "unable to index file");
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
                progress.inc(1);
            });
        }

        self.runner.await_drain();

        let summary = BuildSummary {
            files: files.len(),
            indexed: indexed.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
        };
        progress.finish_with_message(format!("Indexed {} files", summary.indexed));
        Ok(summary)
    }
}
