//! Batch query answering with a per-key result cache
//!
//! Every query line is canonicalized into a [`Query`]. A key that already has
//! results is not searched again. [`QueryBatch`] answers lines on the calling
//! thread; [`QueryBatchRunner`] fans them out over a [`TaskRunner`].

use crate::index::{SearchMode, SearchResult, Searcher};
use crate::query::key::Query;
use crate::runner::TaskRunner;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ranked results per query key, ordered by key
pub type QueryResults = BTreeMap<String, Vec<SearchResult>>;

fn open_lines(path: &Path) -> Result<impl Iterator<Item = std::io::Result<String>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open query file {}", path.display()))?;
    Ok(BufReader::new(file).lines())
}

/// Answers queries one after another on the calling thread
pub struct QueryBatch<'a, S: Searcher + ?Sized> {
    index: &'a S,
    mode: SearchMode,
    results: QueryResults,
    searches: usize,
}

impl<'a, S: Searcher + ?Sized> QueryBatch<'a, S> {
    pub fn new(index: &'a S, mode: SearchMode) -> Self {
        Self {
            index,
            mode,
            results: QueryResults::new(),
            searches: 0,
        }
    }

    pub fn search_line(&mut self, line: &str) {
        let Some(query) = Query::parse(line) else {
            return;
        };
        if self.results.contains_key(&query.key) {
            return;
        }
        let found = self.index.search(&query.stems, self.mode);
        self.searches += 1;
        self.results.insert(query.key, found);
    }

    pub fn search_file(&mut self, path: &Path) -> Result<()> {
        for line in open_lines(path)? {
            let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
            self.search_line(&line);
        }
        Ok(())
    }

    /// Number of searches actually executed (cache misses)
    pub fn searches(&self) -> usize {
        self.searches
    }

    pub fn results(&self) -> &QueryResults {
        &self.results
    }

    pub fn into_results(self) -> QueryResults {
        self.results
    }
}

/// Answers queries in parallel against a shared index
pub struct QueryBatchRunner<S> {
    index: Arc<S>,
    runner: TaskRunner,
    mode: SearchMode,
    results: Arc<Mutex<QueryResults>>,
    searches: Arc<AtomicUsize>,
}

impl<S> QueryBatchRunner<S>
where
    S: Searcher + Send + Sync + 'static,
{
    pub fn new(index: Arc<S>, runner: TaskRunner, mode: SearchMode) -> Self {
        Self {
            index,
            runner,
            mode,
            results: Arc::new(Mutex::new(QueryResults::new())),
            searches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue one line without waiting for it
    pub fn submit(&self, line: String) {
        let index = Arc::clone(&self.index);
        let results = Arc::clone(&self.results);
        let searches = Arc::clone(&self.searches);
        let mode = self.mode;

        self.runner.submit(move |_| {
            let Some(query) = Query::parse(&line) else {
                tracing::trace!(line = %line, "skipping empty query");
                return;
            };
            // Two tasks may both miss on the same key and search twice. Both
            // produce the same ranking, so the duplicate work is harmless.
            if results.lock().contains_key(&query.key) {
                return;
            }

            let found = index.search(&query.stems, mode);
            searches.fetch_add(1, Ordering::Relaxed);
            results.lock().entry(query.key).or_insert(found);
        });
    }

    /// Answer every line and wait for all of them
    pub fn search_lines<I>(&self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        for line in lines {
            self.submit(line);
        }
        self.runner.await_drain();
    }

    /// Answer every line of a query file. Lines already queued before a read
    /// error are still answered before the error is returned.
    pub fn search_file(&self, path: &Path) -> Result<()> {
        let mut outcome = Ok(());
        for line in open_lines(path)? {
            match line {
                Ok(line) => self.submit(line),
                Err(e) => {
                    outcome = Err(e).with_context(|| format!("Failed to read {}", path.display()));
                    break;
                }
            }
        }
        self.runner.await_drain();
        outcome
    }

    /// Number of searches actually executed (cache misses)
    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::Relaxed)
    }

    /// Snapshot of the results gathered so far
    pub fn results(&self) -> QueryResults {
        self.results.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ConcurrentIndex, InvertedIndex};
    use std::fs;
    use tempfile::TempDir;

    fn sample_index() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.add_all("docA", ["the", "cat", "sat"]);
        index.add_all("docB", ["the", "dog", "sat"]);
        index
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sequential_batch_dedups_by_key() {
        let index = sample_index();
        let mut batch = QueryBatch::new(&index, SearchMode::Exact);
        for line in ["sat the", "The SAT", "", "cat", "the sat."] {
            batch.search_line(line);
        }

        assert_eq!(batch.searches(), 2);
        let results = batch.into_results();
        let keys: Vec<&str> = results.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["cat", "sat the"]);
        assert_eq!(results["sat the"].len(), 2);
        assert_eq!(results["sat the"][0].location, "docA");
    }

    #[test]
    fn test_partial_mode() {
        let index = sample_index();
        let mut batch = QueryBatch::new(&index, SearchMode::Partial);
        batch.search_line("ca");
        let results = batch.results();
        assert_eq!(results["ca"].len(), 1);
        assert_eq!(results["ca"][0].count, 1);
    }

    #[test]
    fn test_threaded_matches_sequential() {
        let index = sample_index();
        let queries = lines(&["the", "sat", "dog cat", "d", "t s", "bird", "the", "Sat!"]);

        for mode in [SearchMode::Exact, SearchMode::Partial] {
            let mut sequential = QueryBatch::new(&index, mode);
            for q in &queries {
                sequential.search_line(q);
            }

            let shared = Arc::new(ConcurrentIndex::from(index.clone()));
            let runner = TaskRunner::new(4).unwrap();
            let threaded = QueryBatchRunner::new(shared, runner, mode);
            threaded.search_lines(queries.clone());

            assert_eq!(&threaded.results(), sequential.results());
        }
    }

    #[test]
    fn test_repeated_queries_search_once_on_one_worker() {
        let shared = Arc::new(sample_index());
        let runner = TaskRunner::new(1).unwrap();
        let batch = QueryBatchRunner::new(shared, runner, SearchMode::Exact);

        batch.search_lines(std::iter::repeat_n("the cat".to_string(), 20));

        assert_eq!(batch.searches(), 1);
        assert_eq!(batch.results().len(), 1);
    }

    #[test]
    fn test_repeated_queries_cached_across_workers() {
        let shared = Arc::new(sample_index());
        let runner = TaskRunner::new(4).unwrap();
        let batch = QueryBatchRunner::new(shared, runner, SearchMode::Exact);

        batch.search_lines(std::iter::repeat_n("sat".to_string(), 50));

        assert!(batch.searches() >= 1 && batch.searches() <= 50);
        assert_eq!(batch.results().len(), 1);
    }

    #[test]
    fn test_search_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("queries.txt");
        fs::write(&path, "the\n\ndog\nthe\n").unwrap();

        let shared = Arc::new(ConcurrentIndex::from(sample_index()));
        let batch = QueryBatchRunner::new(shared, TaskRunner::new(2).unwrap(), SearchMode::Exact);
        batch.search_file(&path).unwrap();

        let results = batch.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results["dog"][0].location, "docB");
    }

    #[test]
    fn test_missing_query_file() {
        let dir = TempDir::new().unwrap();
        let index = sample_index();
        let mut batch = QueryBatch::new(&index, SearchMode::Exact);
        assert!(batch.search_file(&dir.path().join("nope.txt")).is_err());
    }
}
